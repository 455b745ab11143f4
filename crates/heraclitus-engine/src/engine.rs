//! Engine facade over one store, one provider and one configuration

use crate::config::{EngineConfig, StoreBackend};
use crate::error::EngineError;
use heraclitus_domain::traits::{ClaimStore, EmbeddingProvider};
use heraclitus_domain::{Claim, StoreError};
use heraclitus_semantic::SemanticBridgeFinder;
use heraclitus_store::{HashEmbeddingProvider, InMemoryStore, SqliteStore};
use heraclitus_temporal::TemporalConfidenceModel;
use std::sync::Arc;

/// Engine over trait objects, as built by `open`
pub type DynEngine = Engine<dyn ClaimStore, dyn EmbeddingProvider>;

/// The temporal model and the semantic bridge finder sharing a store
///
/// # Examples
///
/// ```no_run
/// use heraclitus_engine::{DynEngine, EngineConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EngineConfig::from_file("heraclitus.toml")?;
/// let engine = DynEngine::open(&config)?;
///
/// let aging = engine.temporal().get_aging_claims(180, 0.5, 1_700_000_000).await?;
/// println!("{} aging claims", aging.len());
/// # Ok(())
/// # }
/// ```
pub struct Engine<S: ClaimStore + ?Sized, P: EmbeddingProvider + ?Sized> {
    store: Arc<S>,
    provider: Arc<P>,
    temporal: TemporalConfidenceModel<S>,
    semantic: SemanticBridgeFinder<S, P>,
}

impl DynEngine {
    /// Open the configured store with the built-in hash embedding provider
    pub fn open(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(crate::ConfigError::from)?;

        let store: Arc<dyn ClaimStore> = match config.store.backend {
            StoreBackend::Sqlite => {
                tracing::info!("Opening SQLite store at {}", config.store.path.display());
                Arc::new(SqliteStore::new(&config.store.path)?)
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                Arc::new(InMemoryStore::new())
            }
        };
        let provider: Arc<dyn EmbeddingProvider> =
            Arc::new(HashEmbeddingProvider::new(config.store.embedding_dimension));

        Self::new(store, provider, config)
    }
}

impl<S, P> Engine<S, P>
where
    S: ClaimStore + ?Sized + 'static,
    P: EmbeddingProvider + ?Sized + 'static,
{
    /// Assemble an engine from an existing store and provider
    pub fn new(store: Arc<S>, provider: Arc<P>, config: &EngineConfig) -> Result<Self, EngineError> {
        let temporal = TemporalConfidenceModel::new(store.clone(), config.temporal.clone(), config.batch.clone())?;
        let semantic = SemanticBridgeFinder::new(
            store.clone(),
            provider.clone(),
            config.semantic.clone(),
            config.batch.clone(),
        )?;
        Ok(Self {
            store,
            provider,
            temporal,
            semantic,
        })
    }

    /// Decay, replication, lifecycle and paradigm operations
    pub fn temporal(&self) -> &TemporalConfidenceModel<S> {
        &self.temporal
    }

    /// Embedding, search and bridge operations
    pub fn semantic(&self) -> &SemanticBridgeFinder<S, P> {
        &self.semantic
    }

    /// Shared store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Shared embedding provider
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Register a claim and embed it
    ///
    /// An embedding failure leaves the claim registered without a vector; the
    /// next backfill picks it up.
    pub async fn ingest_claim(&self, claim: Claim, now: u64) -> Result<Claim, EngineError> {
        let claim = self.temporal.register_claim(claim, now).await?;

        let embedding = match self.provider.embed(&claim.text).await {
            Ok(embedding) if embedding.len() == self.provider.dimension() => embedding,
            Ok(embedding) => {
                tracing::warn!(
                    "Claim {} left unembedded: expected {} dimensions, got {}",
                    claim.id,
                    self.provider.dimension(),
                    embedding.len()
                );
                return Ok(claim);
            }
            Err(e) => {
                tracing::warn!("Claim {} left unembedded: {}", claim.id, e);
                return Ok(claim);
            }
        };

        if let Err(e) = self.store.put_embedding(claim.id, embedding.clone()).await {
            tracing::warn!("Claim {} left unembedded: {}", claim.id, e);
            return Ok(claim);
        }
        let id = claim.id;
        Ok(self.store.get(id).await?.ok_or(StoreError::NotFound(id))?)
    }
}
