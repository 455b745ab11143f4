//! Heraclitus Semantic Similarity Engine
//!
//! Maintains claim embeddings and discovers cross-domain bridges: pairs of
//! claims from fields that share no domain tag but say semantically close things.
//!
//! # Architecture
//!
//! - [`SimilarityIndex`]: vectors of one operation, with an exact (all-pairs)
//!   or approximate (HNSW candidates, exact rescoring) strategy
//! - [`SemanticBridgeFinder`]: embedding backfill through the batch
//!   coordinator, similarity search, bridge discovery
//! - [`cosine_similarity`]: the single similarity measure, in f64
//!
//! # Example
//!
//! ```no_run
//! use heraclitus_batch::{BatchConfig, CancellationToken};
//! use heraclitus_semantic::{SemanticBridgeFinder, SemanticConfig};
//! use heraclitus_store::{HashEmbeddingProvider, InMemoryStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let finder = SemanticBridgeFinder::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(HashEmbeddingProvider::default()),
//!     SemanticConfig::default(),
//!     BatchConfig::default(),
//! )?;
//!
//! finder.embed_existing_claims(50, None, &CancellationToken::new()).await?;
//! for bridge in finder.find_cross_domain_by_embedding(None, Some(20), 0).await? {
//!     println!("{} <-> {}: {:.2}", bridge.claim_a, bridge.claim_b, bridge.similarity);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod bridge;
mod config;
mod error;
mod hnsw;
mod index;
mod similarity;

pub use bridge::{EmbeddingStats, SemanticBridgeFinder, SimilarClaim};
pub use config::{HnswParams, IndexStrategy, SemanticConfig};
pub use error::SemanticError;
pub use index::{IndexedClaim, Neighbour, ScoredPair, SimilarityIndex};
pub use similarity::cosine_similarity;
