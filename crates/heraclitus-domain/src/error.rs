//! Error types shared across the engine boundaries

use crate::ClaimId;
use thiserror::Error;

/// Malformed input, rejected before any store access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A claim must belong to at least one domain
    #[error("Domain set cannot be empty")]
    EmptyDomainSet,

    /// A domain tag was blank
    #[error("Domain tags cannot be blank")]
    EmptyDomainTag,

    /// Claim text was blank
    #[error("Claim {0} has no text")]
    EmptyText(ClaimId),

    /// A confidence value was outside [0, 1] or not finite
    #[error("{field} must be in [0, 1], got {value}")]
    ConfidenceOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// A similarity threshold was outside [-1, 1] or not finite
    #[error("Similarity threshold must be in [-1, 1], got {0}")]
    ThresholdOutOfRange(f64),

    /// A claim cannot supersede itself
    #[error("Claim {0} cannot supersede itself")]
    SelfSupersession(ClaimId),

    /// The supersession would close a cycle
    #[error("Superseding claim {claim} by {target} would create a cycle")]
    SupersessionCycle {
        /// Claim being superseded
        claim: ClaimId,
        /// Proposed superseding claim
        target: ClaimId,
    },

    /// Any other malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors reported by a claim store implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Referenced claim is absent
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),

    /// No connection stored for the pair
    #[error("No connection between claims {0} and {1}")]
    ConnectionNotFound(ClaimId, ClaimId),

    /// Optimistic check failed: the row changed since it was read
    #[error("Version conflict on claim {id} (expected version {expected})")]
    Conflict {
        /// Claim whose row changed
        id: ClaimId,
        /// Version the writer read
        expected: u64,
    },

    /// Connection loss, timeout, busy database; safe to retry
    #[error("Transient store error: {0}")]
    Transient(String),

    /// Stored data could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    /// Whether this is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Errors reported by an embedding provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Backend unavailable; transient
    #[error("Embedding provider unavailable: {0}")]
    Provider(String),

    /// The input could not be embedded
    #[error("Embedding model rejected input: {0}")]
    Model(String),

    /// The provider returned a vector of the wrong length
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension returned
        actual: usize,
    },
}

impl EmbeddingError {
    /// Whether the failure concerns the backend rather than the input
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Provider(_))
    }
}
