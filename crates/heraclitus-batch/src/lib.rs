//! Heraclitus Batch Processing
//!
//! Bulk-operation plumbing shared by the temporal and semantic subsystems.
//!
//! # Overview
//!
//! - **ClaimBatches**: lazy, restartable iterator over claim batches using keyset
//!   pagination by ascending claim id
//! - **BatchCoordinator**: keeps at most `max_concurrency` batches in flight and
//!   merges per-batch outcomes into one [`BatchReport`]
//! - **CancellationToken**: cooperative cancellation, checked between batches
//! - **RetryPolicy**: bounded exponential backoff for transient store errors
//! - **update_claim**: optimistic read-modify-write retried on version conflict
//!
//! Per-row failures never abort a run; they are tallied as [`ItemError`]s. Only a
//! systemic failure (the batch scan exhausting its retries) ends a run early.
//!
//! # Usage
//!
//! ```no_run
//! use heraclitus_batch::{BatchConfig, BatchCoordinator, BatchOutcome, CancellationToken, ClaimBatches};
//! use heraclitus_domain::traits::ClaimQuery;
//! use heraclitus_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let config = BatchConfig::default();
//! let batches = ClaimBatches::new(store, ClaimQuery::default(), config.batch_size)?;
//!
//! let report = BatchCoordinator::new(&config)
//!     .run("count", batches, &CancellationToken::new(), |claims| async move {
//!         let mut outcome = BatchOutcome::default();
//!         outcome.succeeded = claims.len();
//!         outcome
//!     })
//!     .await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod atomic;
mod batches;
mod cancel;
mod config;
mod coordinator;
mod error;
mod report;
mod retry;

pub use atomic::update_claim;
pub use batches::ClaimBatches;
pub use cancel::CancellationToken;
pub use config::BatchConfig;
pub use coordinator::BatchCoordinator;
pub use error::BatchError;
pub use report::{BatchOutcome, BatchReport, ItemError, ItemErrorKind};
pub use retry::RetryPolicy;
