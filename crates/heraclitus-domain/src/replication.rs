//! Replication events - the append-only ledger of replication attempts

use crate::{ClaimId, ReplicationStatus};
use std::fmt;

/// Outcome of a single replication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplicationOutcome {
    /// The result was reproduced
    Success,
    /// The result was partially reproduced
    Partial,
    /// The result could not be reproduced
    Failure,
}

impl ReplicationOutcome {
    /// Map the `(success, partial)` flag pair used by callers to an outcome
    ///
    /// `partial` wins over `success`.
    ///
    /// ```
    /// use heraclitus_domain::ReplicationOutcome;
    ///
    /// assert_eq!(ReplicationOutcome::from_flags(true, false), ReplicationOutcome::Success);
    /// assert_eq!(ReplicationOutcome::from_flags(true, true), ReplicationOutcome::Partial);
    /// assert_eq!(ReplicationOutcome::from_flags(false, false), ReplicationOutcome::Failure);
    /// ```
    pub fn from_flags(success: bool, partial: bool) -> Self {
        if partial {
            ReplicationOutcome::Partial
        } else if success {
            ReplicationOutcome::Success
        } else {
            ReplicationOutcome::Failure
        }
    }

    /// Get the outcome name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationOutcome::Success => "success",
            ReplicationOutcome::Partial => "partial",
            ReplicationOutcome::Failure => "failure",
        }
    }

    /// Parse an outcome from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ReplicationOutcome::Success),
            "partial" => Some(ReplicationOutcome::Partial),
            "failure" => Some(ReplicationOutcome::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for ReplicationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded replication attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationEvent {
    /// Claim the attempt targeted
    pub claim_id: ClaimId,

    /// What happened
    pub outcome: ReplicationOutcome,

    /// Replication status of the claim after the attempt
    pub resulting_status: ReplicationStatus,

    /// When the attempt was recorded (unix seconds)
    pub recorded_at: u64,
}

impl ReplicationEvent {
    /// Whether the attempt counts towards a replication-crisis burst
    pub fn is_adverse(&self) -> bool {
        self.outcome == ReplicationOutcome::Failure
            || self.resulting_status == ReplicationStatus::Disputed
    }
}
