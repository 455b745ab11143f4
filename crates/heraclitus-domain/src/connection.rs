//! Connection module - semantic bridges between claims of different fields

use crate::{ClaimId, DomainSet};

/// A semantic relationship between two claims
///
/// Pairs are unordered; the constructor normalises them so that
/// `claim_a < claim_b`. A connection is never mutated after creation except for
/// invalidation by an external curation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Lower claim id of the pair
    pub claim_a: ClaimId,

    /// Higher claim id of the pair
    pub claim_b: ClaimId,

    /// Domains of `claim_a`
    pub domain_a: DomainSet,

    /// Domains of `claim_b`
    pub domain_b: DomainSet,

    /// Cosine similarity of the two embeddings, in [-1, 1]
    pub similarity: f64,

    /// When the bridge was discovered (unix seconds)
    pub discovered_at: u64,

    /// Set by external curation only
    pub invalidated: bool,
}

impl Connection {
    /// Create a connection, normalising the pair order
    ///
    /// # Panics
    /// Panics if both ids are equal or the similarity is outside [-1, 1]
    pub fn new(
        first: (ClaimId, DomainSet),
        second: (ClaimId, DomainSet),
        similarity: f64,
        discovered_at: u64,
    ) -> Self {
        assert!(first.0 != second.0, "A claim cannot bridge to itself");
        assert!(
            (-1.0..=1.0).contains(&similarity),
            "Similarity must be in [-1, 1]"
        );

        let ((claim_a, domain_a), (claim_b, domain_b)) = if first.0 < second.0 {
            (first, second)
        } else {
            (second, first)
        };

        Self {
            claim_a,
            claim_b,
            domain_a,
            domain_b,
            similarity,
            discovered_at,
            invalidated: false,
        }
    }

    /// True when the two sides share no domain tag
    pub fn is_cross_domain(&self) -> bool {
        self.domain_a.is_disjoint(&self.domain_b)
    }
}
