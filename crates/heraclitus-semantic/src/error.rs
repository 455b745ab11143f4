//! Error types for semantic operations

use heraclitus_batch::BatchError;
use heraclitus_domain::{ClaimId, EmbeddingError, StoreError, ValidationError};
use thiserror::Error;

/// Errors from similarity search and bridge discovery
#[derive(Error, Debug)]
pub enum SemanticError {
    /// Referenced claim does not exist
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),

    /// The anchor claim has no stored embedding
    #[error("Claim {0} has no embedding")]
    MissingEmbedding(ClaimId),

    /// Rejected before any store access
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Embedding provider failure
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Bulk operation aborted
    #[error(transparent)]
    Batch(BatchError),
}

impl From<StoreError> for SemanticError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SemanticError::NotFound(id),
            other => SemanticError::Store(other),
        }
    }
}

impl From<BatchError> for SemanticError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Store(e) => e.into(),
            BatchError::Validation(e) => SemanticError::Validation(e),
            aborted => SemanticError::Batch(aborted),
        }
    }
}
