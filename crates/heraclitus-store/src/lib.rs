//! Heraclitus Storage Layer
//!
//! Implementations of the `ClaimStore` and `EmbeddingProvider` collaborator traits.
//!
//! # Architecture
//!
//! - [`InMemoryStore`]: arena-style claim table behind `RwLock`, used by tests and
//!   short-lived runs
//! - [`SqliteStore`]: SQLite for durable claim data, domain membership, patterns,
//!   connections and the replication ledger
//! - [`HashEmbeddingProvider`]: deterministic hash-based embeddings for offline use
//!
//! # Examples
//!
//! ```no_run
//! use heraclitus_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for claim operations
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod memory;
pub mod sqlite;

pub use embedding::HashEmbeddingProvider;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
