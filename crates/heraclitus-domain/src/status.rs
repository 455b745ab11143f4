//! Status module - replication and lifecycle states for claims

use std::fmt;

/// Replication state of a claim
///
/// `Disputed` is terminal for automated transitions; leaving it requires an
/// explicit external override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReplicationStatus {
    /// No replication attempt recorded
    Unreplicated,

    /// A replication attempt is known to be under way
    Pending,

    /// At least one partial confirmation, or recovering after a failure
    Partial,

    /// Independently confirmed
    Successful,

    /// Replication attempts failed
    Failed,

    /// Repeated failures exceeded the dispute threshold
    Disputed,
}

impl ReplicationStatus {
    /// All replication states, in declaration order
    pub const ALL: [ReplicationStatus; 6] = [
        ReplicationStatus::Unreplicated,
        ReplicationStatus::Pending,
        ReplicationStatus::Partial,
        ReplicationStatus::Successful,
        ReplicationStatus::Failed,
        ReplicationStatus::Disputed,
    ];

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationStatus::Unreplicated => "unreplicated",
            ReplicationStatus::Pending => "pending",
            ReplicationStatus::Partial => "partial",
            ReplicationStatus::Successful => "successful",
            ReplicationStatus::Failed => "failed",
            ReplicationStatus::Disputed => "disputed",
        }
    }

    /// Parse a status from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unreplicated" => Some(ReplicationStatus::Unreplicated),
            "pending" => Some(ReplicationStatus::Pending),
            "partial" => Some(ReplicationStatus::Partial),
            "successful" => Some(ReplicationStatus::Successful),
            "failed" => Some(ReplicationStatus::Failed),
            "disputed" => Some(ReplicationStatus::Disputed),
            _ => None,
        }
    }

    /// Whether automated transitions may leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplicationStatus::Disputed)
    }
}

impl std::str::FromStr for ReplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid replication status: {}", s))
    }
}

impl fmt::Display for ReplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClaimStatus {
    /// Current knowledge
    Active,

    /// Old and losing confidence, a candidate for re-review
    Aging,

    /// Replaced by a newer claim
    Superseded,

    /// Withdrawn by its source
    Retracted,
}

impl ClaimStatus {
    /// All lifecycle states, in declaration order
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Active,
        ClaimStatus::Aging,
        ClaimStatus::Superseded,
        ClaimStatus::Retracted,
    ];

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Active => "active",
            ClaimStatus::Aging => "aging",
            ClaimStatus::Superseded => "superseded",
            ClaimStatus::Retracted => "retracted",
        }
    }

    /// Parse a status from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(ClaimStatus::Active),
            "aging" => Some(ClaimStatus::Aging),
            "superseded" => Some(ClaimStatus::Superseded),
            "retracted" => Some(ClaimStatus::Retracted),
            _ => None,
        }
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid claim status: {}", s))
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_status_names() {
        for status in ReplicationStatus::ALL {
            assert_eq!(ReplicationStatus::parse(status.as_str()), Some(status));
        }
        assert!("bogus".parse::<ReplicationStatus>().is_err());
    }

    #[test]
    fn test_only_disputed_is_terminal() {
        let terminal: Vec<_> = ReplicationStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![&ReplicationStatus::Disputed]);
    }

    #[test]
    fn test_claim_status_names() {
        for status in ClaimStatus::ALL {
            assert_eq!(status.as_str().parse::<ClaimStatus>(), Ok(status));
        }
    }
}
