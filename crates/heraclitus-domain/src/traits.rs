//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the engine and its collaborators.
//! Implementations live in other crates (`heraclitus-store` ships an in-memory and
//! a SQLite store plus a deterministic embedding provider).
//!
//! Both traits are async: every store access and every provider call is a
//! suspension point for the engine's batch tasks.

use crate::time::day_index;
use crate::{
    Claim, ClaimId, ClaimStatus, Connection, EmbeddingError, ReplicationEvent, StoreError,
    TemporalPattern,
};
use async_trait::async_trait;

/// Filter on the presence of a claim embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingFilter {
    /// No filtering
    #[default]
    Any,
    /// Only claims with an embedding
    Present,
    /// Only claims without an embedding
    Missing,
}

/// Query criteria for scanning claims
///
/// Results are always ordered by ascending claim id, so `after_id` gives keyset
/// pagination that can be resumed from any previously returned id.
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    /// Only claims tagged with this domain
    pub domain: Option<String>,

    /// Only claims in this lifecycle state
    pub status: Option<ClaimStatus>,

    /// Embedding presence
    pub embedding: EmbeddingFilter,

    /// Only claims first seen at or after this timestamp
    pub first_seen_from: Option<u64>,

    /// Only claims first seen at or before this timestamp
    pub first_seen_until: Option<u64>,

    /// Only claims with `current_confidence` strictly below this value
    pub max_confidence: Option<f64>,

    /// Only claims whose confidence was not recomputed on this UTC day
    pub not_recomputed_on_day: Option<u64>,

    /// Only claims with an id strictly greater than this one
    pub after_id: Option<ClaimId>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl ClaimQuery {
    /// Whether a claim satisfies every filter (ignores `after_id` and `limit`)
    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(domain) = &self.domain {
            if !claim.domains.contains(domain) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if claim.status != status {
                return false;
            }
        }
        match self.embedding {
            EmbeddingFilter::Any => {}
            EmbeddingFilter::Present if !claim.has_embedding() => return false,
            EmbeddingFilter::Missing if claim.has_embedding() => return false,
            _ => {}
        }
        if let Some(from) = self.first_seen_from {
            if claim.first_seen < from {
                return false;
            }
        }
        if let Some(until) = self.first_seen_until {
            if claim.first_seen > until {
                return false;
            }
        }
        if let Some(max) = self.max_confidence {
            if claim.current_confidence >= max {
                return false;
            }
        }
        if let Some(day) = self.not_recomputed_on_day {
            if claim.confidence_updated_at.map(day_index) == Some(day) {
                return false;
            }
        }
        true
    }
}

/// One page of a scan, with rows that could not be decoded kept apart
///
/// `malformed` rows count toward the query limit and are ordered with the
/// decoded claims, so a keyset cursor can move past them.
#[derive(Debug, Default)]
pub struct ScanPage {
    /// Decoded claims, ascending by id
    pub claims: Vec<Claim>,
    /// Rows that failed to decode, ascending by id
    pub malformed: Vec<(ClaimId, StoreError)>,
}

impl ScanPage {
    /// Rows read from the store, decoded or not
    pub fn rows(&self) -> usize {
        self.claims.len() + self.malformed.len()
    }

    /// Highest id on the page, decoded or not
    pub fn last_id(&self) -> Option<ClaimId> {
        let claim = self.claims.last().map(|c| c.id);
        let malformed = self.malformed.last().map(|(id, _)| *id);
        claim.max(malformed)
    }
}

/// Durable storage of claims, patterns, connections and replication events
///
/// Implemented by the infrastructure layer (heraclitus-store).
///
/// Writes of a single claim row are atomic. `compare_and_put` is the optimistic
/// check used for every read-modify-write so that overlapping decay and
/// replication updates never lose each other's changes.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Get a claim by id
    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError>;

    /// Atomic upsert; the stored version becomes the previous version plus one
    async fn put(&self, claim: Claim) -> Result<(), StoreError>;

    /// Write `claim` only if the stored version still equals `claim.version`
    ///
    /// Fails with [`StoreError::Conflict`] when the row changed and with
    /// [`StoreError::NotFound`] when it does not exist.
    async fn compare_and_put(&self, claim: Claim) -> Result<(), StoreError>;

    /// Claims matching the query, ascending by id
    async fn scan(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError>;

    /// Like [`scan`](Self::scan), but a row that fails to decode is returned in
    /// [`ScanPage::malformed`] instead of failing the page
    async fn scan_page(&self, query: &ClaimQuery) -> Result<ScanPage, StoreError> {
        Ok(ScanPage {
            claims: self.scan(query).await?,
            malformed: Vec::new(),
        })
    }

    /// Number of claims matching the query (`after_id` and `limit` honoured)
    async fn count(&self, query: &ClaimQuery) -> Result<usize, StoreError> {
        Ok(self.scan(query).await?.len())
    }

    /// Store an embedding for an existing claim without touching other fields
    async fn put_embedding(&self, id: ClaimId, embedding: Vec<f32>) -> Result<(), StoreError>;

    /// Persist a newly detected pattern
    async fn insert_pattern(&self, pattern: TemporalPattern) -> Result<(), StoreError>;

    /// All stored patterns, oldest detection first
    async fn patterns(&self) -> Result<Vec<TemporalPattern>, StoreError>;

    /// Persist a discovered connection (idempotent per claim pair)
    async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError>;

    /// All stored connections
    async fn connections(&self) -> Result<Vec<Connection>, StoreError>;

    /// Mark a connection invalid (external curation)
    async fn invalidate_connection(&self, a: ClaimId, b: ClaimId) -> Result<(), StoreError>;

    /// Append a replication attempt to the ledger
    async fn append_replication_event(&self, event: ReplicationEvent) -> Result<(), StoreError>;

    /// Replication events recorded at or after `since`, oldest first
    async fn replication_events(&self, since: u64) -> Result<Vec<ReplicationEvent>, StoreError>;
}

/// Maps text to a fixed-dimension vector
///
/// Implementations may be swapped without affecting the engine.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier
    fn model_name(&self) -> &str;

    /// Dimension of the vectors produced
    fn dimension(&self) -> usize;

    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts in one call
    ///
    /// The default implementation embeds them one by one.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
