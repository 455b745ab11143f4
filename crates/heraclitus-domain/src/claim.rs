//! Claim module - the unit of knowledge whose credibility evolves over time

use crate::status::{ClaimStatus, ReplicationStatus};
use crate::time;
use crate::ValidationError;
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a claim
///
/// Assigned by the ingestion pipeline and immutable afterwards. Every relation
/// between claims (supersession, bridges, pattern membership) is expressed with
/// these ids rather than with references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u64);

impl ClaimId {
    /// Create a ClaimId from its raw value
    ///
    /// # Examples
    ///
    /// ```
    /// use heraclitus_domain::ClaimId;
    ///
    /// let id = ClaimId::from_value(42);
    /// assert_eq!(id.value(), 42);
    /// assert_eq!(id.to_string(), "42");
    /// ```
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ClaimId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid claim id '{}': {}", s, e))
    }
}

/// Category of an asserted claim
///
/// Each category carries its own baseline half-life: empirical results age faster
/// than theoretical frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClaimType {
    /// A measured experimental or observational result
    Empirical,
    /// A theoretical proposition or model
    Theoretical,
    /// A claim about methods or protocols
    Methodological,
    /// A descriptive observation without intervention
    Observational,
    /// A proposed but untested explanation
    Hypothesis,
    /// A synthesis over several studies
    MetaAnalysis,
}

impl ClaimType {
    /// All claim types, in declaration order
    pub const ALL: [ClaimType; 6] = [
        ClaimType::Empirical,
        ClaimType::Theoretical,
        ClaimType::Methodological,
        ClaimType::Observational,
        ClaimType::Hypothesis,
        ClaimType::MetaAnalysis,
    ];

    /// Get the claim type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Empirical => "empirical",
            ClaimType::Theoretical => "theoretical",
            ClaimType::Methodological => "methodological",
            ClaimType::Observational => "observational",
            ClaimType::Hypothesis => "hypothesis",
            ClaimType::MetaAnalysis => "meta_analysis",
        }
    }

    /// Parse a claim type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "empirical" | "empirical_result" => Some(ClaimType::Empirical),
            "theoretical" | "theoretical_claim" => Some(ClaimType::Theoretical),
            "methodological" | "methodology" => Some(ClaimType::Methodological),
            "observational" | "observation" => Some(ClaimType::Observational),
            "hypothesis" => Some(ClaimType::Hypothesis),
            "meta_analysis" | "review" => Some(ClaimType::MetaAnalysis),
            _ => None,
        }
    }
}

impl std::str::FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid claim type: {}", s))
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty, order-irrelevant set of domain tags
///
/// Tags are trimmed; blank tags are rejected.
///
/// # Examples
///
/// ```
/// use heraclitus_domain::DomainSet;
///
/// let math = DomainSet::new(["math"]).unwrap();
/// let bio = DomainSet::new(["biology", "genetics"]).unwrap();
/// assert!(math.is_disjoint(&bio));
/// assert!(DomainSet::new(Vec::<String>::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainSet(BTreeSet<String>);

impl DomainSet {
    /// Build a domain set from tags
    ///
    /// # Errors
    /// Returns a validation error if the set is empty or a tag is blank
    pub fn new<I, T>(tags: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut set = BTreeSet::new();
        for tag in tags {
            let tag: String = tag.into();
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::EmptyDomainTag);
            }
            set.insert(trimmed.to_string());
        }

        if set.is_empty() {
            return Err(ValidationError::EmptyDomainSet);
        }

        Ok(Self(set))
    }

    /// True when the two sets share no tag
    pub fn is_disjoint(&self, other: &DomainSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Check whether the set contains a tag
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Iterate over tags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of tags (always at least one)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.iter().collect();
        write!(f, "{}", tags.join(", "))
    }
}

/// A claim - a single asserted fact extracted from a source
///
/// `original_confidence`, `first_seen` and `id` never change after creation.
/// `current_confidence` is derived from the original confidence, the claim's age
/// and its replication and citation history; it is written only by the temporal
/// model's recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// The asserted statement
    pub text: String,

    /// Category, selects the baseline half-life
    pub claim_type: ClaimType,

    /// Fields this claim belongs to
    pub domains: DomainSet,

    /// Confidence at extraction time, in [0, 1]
    pub original_confidence: f64,

    /// Confidence after decay and adjustments, in [0, 1]
    pub current_confidence: f64,

    /// When the claim was first seen (unix seconds)
    pub first_seen: u64,

    /// Last successful replication
    pub last_confirmed: Option<u64>,

    /// Last citation event
    pub last_cited: Option<u64>,

    /// Last time `current_confidence` was recomputed
    pub confidence_updated_at: Option<u64>,

    /// Replication state
    pub replication_status: ReplicationStatus,

    /// Successful replication attempts
    pub replication_count: u32,

    /// Partially successful replication attempts
    pub partial_replication_count: u32,

    /// Failed replication attempts
    pub failed_replication_count: u32,

    /// Total citations (never decreases)
    pub citation_count: u64,

    /// Lifecycle state
    pub status: ClaimStatus,

    /// Claim that replaces this one
    pub superseded_by: Option<ClaimId>,

    /// Text embedding, absent until computed
    pub embedding: Option<Vec<f32>>,

    /// Row version maintained by the store for optimistic updates
    pub version: u64,
}

impl Claim {
    /// Create a new, unreplicated, active claim
    ///
    /// # Errors
    /// Returns a validation error if the text is blank or the confidence is not in [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use heraclitus_domain::{Claim, ClaimId, ClaimType, DomainSet};
    ///
    /// let claim = Claim::new(
    ///     ClaimId::from_value(1),
    ///     "Sleep consolidates declarative memory",
    ///     ClaimType::Empirical,
    ///     DomainSet::new(["neuroscience"]).unwrap(),
    ///     0.8,
    ///     1_700_000_000,
    /// ).unwrap();
    /// assert_eq!(claim.current_confidence, 0.8);
    /// assert_eq!(claim.confidence_trend(), 0.0);
    /// ```
    pub fn new(
        id: ClaimId,
        text: impl Into<String>,
        claim_type: ClaimType,
        domains: DomainSet,
        original_confidence: f64,
        first_seen: u64,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText(id));
        }
        check_unit_interval("original_confidence", original_confidence)?;

        Ok(Self {
            id,
            text,
            claim_type,
            domains,
            original_confidence,
            current_confidence: original_confidence,
            first_seen,
            last_confirmed: None,
            last_cited: None,
            confidence_updated_at: None,
            replication_status: ReplicationStatus::Unreplicated,
            replication_count: 0,
            partial_replication_count: 0,
            failed_replication_count: 0,
            citation_count: 0,
            status: ClaimStatus::Active,
            superseded_by: None,
            embedding: None,
            version: 0,
        })
    }

    /// Attach an embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Check the row-level invariants
    ///
    /// Used by bulk operations to skip malformed rows instead of failing the batch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText(self.id));
        }
        if self.domains.is_empty() {
            return Err(ValidationError::EmptyDomainSet);
        }
        check_unit_interval("original_confidence", self.original_confidence)?;
        check_unit_interval("current_confidence", self.current_confidence)?;
        if self.superseded_by == Some(self.id) {
            return Err(ValidationError::SelfSupersession(self.id));
        }
        Ok(())
    }

    /// Whole days elapsed since `first_seen`
    pub fn age_days(&self, now: u64) -> u64 {
        time::whole_days_between(self.first_seen, now)
    }

    /// `current_confidence - original_confidence`
    pub fn confidence_trend(&self) -> f64 {
        self.current_confidence - self.original_confidence
    }

    /// Citations per 30-day month, with the age floored at one month
    pub fn citation_velocity(&self, now: u64) -> f64 {
        let months = (self.age_days(now) as f64 / 30.0).max(1.0);
        self.citation_count as f64 / months
    }

    /// Whether an embedding has been computed
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ConfidenceOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(confidence: f64) -> Result<Claim, ValidationError> {
        Claim::new(
            ClaimId::from_value(7),
            "Gut microbiota modulate anxiety-like behaviour",
            ClaimType::Empirical,
            DomainSet::new(["biology"]).unwrap(),
            confidence,
            1_000_000,
        )
    }

    #[test]
    fn test_claim_id_ordering() {
        let id1 = ClaimId::from_value(1000);
        let id2 = ClaimId::from_value(2000);

        assert!(id1 < id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_claim_id_parse() {
        assert_eq!("42".parse::<ClaimId>().unwrap(), ClaimId::from_value(42));
        assert!("forty-two".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_claim_type_round_trip_names() {
        for ty in ClaimType::ALL {
            assert_eq!(ClaimType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ClaimType::parse("empirical_result"), Some(ClaimType::Empirical));
        assert!(ClaimType::parse("rumour").is_none());
    }

    #[test]
    fn test_domain_set_ignores_order_and_duplicates() {
        let a = DomainSet::new(["physics", "math", "physics"]).unwrap();
        let b = DomainSet::new([" math ", "physics"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.to_string(), "math, physics");
    }

    #[test]
    fn test_domain_set_rejects_blank_tags() {
        assert!(matches!(
            DomainSet::new(["  "]),
            Err(ValidationError::EmptyDomainTag)
        ));
    }

    #[test]
    fn test_new_claim_rejects_out_of_range_confidence() {
        assert!(claim(1.2).is_err());
        assert!(claim(-0.1).is_err());
        assert!(claim(f64::NAN).is_err());
        assert!(claim(0.0).is_ok());
        assert!(claim(1.0).is_ok());
    }

    #[test]
    fn test_validate_detects_self_supersession() {
        let mut c = claim(0.5).unwrap();
        c.superseded_by = Some(c.id);
        assert!(matches!(c.validate(), Err(ValidationError::SelfSupersession(_))));
    }

    #[test]
    fn test_age_and_velocity() {
        let mut c = claim(0.5).unwrap();
        c.citation_count = 12;
        let now = c.first_seen + 90 * time::SECONDS_PER_DAY + 100;
        assert_eq!(c.age_days(now), 90);
        assert!((c.citation_velocity(now) - 4.0).abs() < 1e-9);

        // Young claims are floored at one month
        let young = c.first_seen + 3 * time::SECONDS_PER_DAY;
        assert!((c.citation_velocity(young) - 12.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: disjointness is symmetric
        #[test]
        fn test_disjoint_symmetric(a in proptest::collection::vec("[a-d]", 1..4),
                                   b in proptest::collection::vec("[a-d]", 1..4)) {
            let a = DomainSet::new(a).unwrap();
            let b = DomainSet::new(b).unwrap();
            prop_assert_eq!(a.is_disjoint(&b), b.is_disjoint(&a));
        }

        /// Property: id ordering matches raw value ordering
        #[test]
        fn test_id_ordering_property(a: u64, b: u64) {
            prop_assert_eq!(ClaimId::from_value(a) < ClaimId::from_value(b), a < b);
        }
    }
}
