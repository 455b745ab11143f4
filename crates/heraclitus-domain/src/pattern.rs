//! Temporal pattern module - aggregate signals detected over many claims

use crate::ClaimId;
use std::fmt;

/// Unique identifier for a detected pattern, based on UUIDv7
///
/// UUIDv7 keeps detections chronologically sortable, which is how the history
/// of repeated detections is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(u128);

impl PatternId {
    /// Generate a new UUIDv7-based PatternId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a PatternId from a raw u128 value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a PatternId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Kind of detected pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternType {
    /// Confidence in a cluster of same-domain claims dropped well beyond natural decay
    ConfidenceCollapse,

    /// Failed replications co-occur with a burst of superseding claims
    ReplicationCrisis,
}

impl PatternType {
    /// Get the pattern type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::ConfidenceCollapse => "confidence_collapse",
            PatternType::ReplicationCrisis => "replication_crisis",
        }
    }

    /// Parse a pattern type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confidence_collapse" => Some(PatternType::ConfidenceCollapse),
            "replication_crisis" => Some(PatternType::ReplicationCrisis),
            _ => None,
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected aggregate signal
///
/// Created only by detection passes and never mutated; re-detection creates a new
/// record.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalPattern {
    /// Unique identifier
    pub id: PatternId,

    /// Kind of pattern
    pub pattern_type: PatternType,

    /// Domain tag the cluster was grouped under
    pub domain: String,

    /// Human-readable summary
    pub description: String,

    /// Detection confidence in [0, 1]
    pub confidence: f64,

    /// How recent the involved claims are, in [0, 1]
    pub novelty_score: f64,

    /// Claims making up the cluster (never empty)
    pub claims_involved: Vec<ClaimId>,

    /// Start of the time bucket the cluster falls in (unix seconds)
    pub start_date: u64,

    /// When the detection ran (unix seconds)
    pub detected_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_ids_are_chronological() {
        let a = PatternId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = PatternId::new();
        assert!(a < b);
    }

    #[test]
    fn test_pattern_id_display_and_parse() {
        let id = PatternId::new();
        let parsed = PatternId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(PatternId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_pattern_type_names() {
        for ty in [PatternType::ConfidenceCollapse, PatternType::ReplicationCrisis] {
            assert_eq!(PatternType::parse(ty.as_str()), Some(ty));
        }
    }
}
