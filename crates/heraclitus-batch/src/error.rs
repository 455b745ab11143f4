//! Error types for batch operations

use crate::BatchReport;
use heraclitus_domain::{StoreError, ValidationError};
use thiserror::Error;

/// Errors that end a batch operation or a single-row update
#[derive(Error, Debug)]
pub enum BatchError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Rejected input or configuration
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The batch scan failed after its retries; work done so far is in `partial`
    #[error("Batch operation '{}' aborted after {} items: {source}", .partial.operation, .partial.total_processed())]
    Aborted {
        /// Underlying store failure
        source: StoreError,
        /// Report covering every batch that completed
        partial: Box<BatchReport>,
    },
}

impl BatchError {
    /// Whether the error is a missing claim
    pub fn is_not_found(&self) -> bool {
        matches!(self, BatchError::Store(StoreError::NotFound(_)))
    }
}
