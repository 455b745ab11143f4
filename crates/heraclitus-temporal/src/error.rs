//! Error types for temporal operations

use heraclitus_batch::BatchError;
use heraclitus_domain::{ClaimId, StoreError, ValidationError};
use thiserror::Error;

/// Errors from the temporal confidence model
#[derive(Error, Debug)]
pub enum TemporalError {
    /// Referenced claim does not exist
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),

    /// Rejected before any store access
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Bulk operation aborted
    #[error(transparent)]
    Batch(BatchError),
}

impl From<StoreError> for TemporalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TemporalError::NotFound(id),
            other => TemporalError::Store(other),
        }
    }
}

impl From<BatchError> for TemporalError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Store(e) => e.into(),
            BatchError::Validation(e) => TemporalError::Validation(e),
            aborted => TemporalError::Batch(aborted),
        }
    }
}
