//! Heraclitus Domain Layer
//!
//! Core model for the knowledge evolution engine: claims harvested from papers,
//! their replication and lifecycle state, the patterns and cross-domain bridges
//! detected over them, and the trait boundaries to the external collaborators
//! (claim store and embedding provider).
//!
//! ## Key Concepts
//!
//! - **Claim**: a single extracted assertion whose confidence decays with age and
//!   is reshaped by replication outcomes and citation activity
//! - **DomainSet**: the non-empty set of field tags a claim belongs to
//! - **TemporalPattern**: an immutable aggregate signal such as a paradigm shift
//! - **Connection**: a semantic bridge between two claims with disjoint domains
//! - **ReplicationEvent**: append-only ledger entry for every replication attempt
//!
//! ## Architecture
//!
//! - Pure data and validation only
//! - Relations between claims are id references (arena style), never object graphs
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod connection;
pub mod error;
pub mod pattern;
pub mod replication;
pub mod status;
pub mod time;
pub mod traits;

// Re-exports for convenience
pub use claim::{Claim, ClaimId, ClaimType, DomainSet};
pub use connection::Connection;
pub use error::{EmbeddingError, StoreError, ValidationError};
pub use pattern::{PatternId, PatternType, TemporalPattern};
pub use replication::{ReplicationEvent, ReplicationOutcome};
pub use status::{ClaimStatus, ReplicationStatus};
