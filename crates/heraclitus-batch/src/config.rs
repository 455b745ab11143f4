//! Configuration for bulk operations

use crate::RetryPolicy;
use heraclitus_domain::ValidationError;
use serde::{Deserialize, Serialize};

/// Batch sizing, concurrency and retry bounds
///
/// # Examples
///
/// ```
/// use heraclitus_batch::BatchConfig;
///
/// let config = BatchConfig::default();
/// assert_eq!(config.batch_size, 100);
/// assert_eq!(config.max_concurrency, 4);
///
/// let config = BatchConfig::aggressive();
/// assert_eq!(config.max_concurrency, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Claims per batch
    /// Default: 100
    pub batch_size: usize,

    /// Batches processed concurrently
    /// Default: 4
    pub max_concurrency: usize,

    /// Attempts at an optimistic update before the item is reported as conflicted
    /// Default: 5
    pub max_conflict_retries: u32,

    /// Backoff for transient store errors
    pub retry: RetryPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrency: 4,
            max_conflict_retries: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl BatchConfig {
    /// Larger batches and more parallelism, for a dedicated maintenance host
    pub fn aggressive() -> Self {
        Self {
            batch_size: 500,
            max_concurrency: 8,
            max_conflict_retries: 10,
            retry: RetryPolicy {
                max_attempts: 5,
                ..RetryPolicy::default()
            },
        }
    }

    /// Small batches, low parallelism, for sharing a store with interactive use
    pub fn lenient() -> Self {
        Self {
            batch_size: 25,
            max_concurrency: 1,
            max_conflict_retries: 5,
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff_ms: 100,
                max_backoff_ms: 5_000,
            },
        }
    }

    /// Reject zero sizes
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ValidationError::InvalidArgument(
                "max_concurrency must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::InvalidArgument(
                "retry.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
