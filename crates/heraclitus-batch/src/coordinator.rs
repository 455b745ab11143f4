//! Bounded-concurrency driver for bulk operations

use crate::{BatchConfig, BatchError, BatchOutcome, BatchReport, CancellationToken, ClaimBatches};
use heraclitus_domain::traits::ClaimStore;
use heraclitus_domain::Claim;
use std::future::Future;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};

/// Runs a per-batch work function over [`ClaimBatches`]
///
/// At most `max_concurrency` batches are in flight at once. Cancellation is
/// checked before each new batch is fetched; batches already running finish and
/// their outcomes are included in the report.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    max_concurrency: usize,
}

impl BatchCoordinator {
    /// Create a coordinator from configuration
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Maximum batches in flight
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Drive `work` over every batch
    ///
    /// Returns [`BatchError::Aborted`] only when fetching a batch fails after its
    /// retries; per-item failures, including rows the store could not decode,
    /// are part of the report.
    pub async fn run<S, F, Fut>(
        &self,
        operation: &str,
        mut batches: ClaimBatches<S>,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Result<BatchReport, BatchError>
    where
        S: ClaimStore + ?Sized,
        F: FnMut(Vec<Claim>) -> Fut,
        Fut: Future<Output = BatchOutcome> + Send + 'static,
    {
        let started = Instant::now();
        let mut report = BatchReport::new(operation);
        let mut in_flight: JoinSet<BatchOutcome> = JoinSet::new();
        let mut failure = None;

        tracing::info!("Starting {} (max {} batches in flight)", operation, self.max_concurrency);

        loop {
            while in_flight.len() >= self.max_concurrency {
                if let Some(joined) = in_flight.join_next().await {
                    Self::merge(&mut report, joined);
                }
            }

            if cancel.is_cancelled() {
                tracing::info!("{} cancelled; draining {} in-flight batches", operation, in_flight.len());
                report.cancelled = true;
                break;
            }

            let next = batches.next_batch().await;
            report.errors.extend(batches.take_malformed());

            match next {
                Ok(Some(batch)) => {
                    tracing::debug!("{}: dispatching batch of {} claims", operation, batch.len());
                    in_flight.spawn(work(batch));
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("{}: batch scan failed: {}", operation, e);
                    failure = Some(e);
                    break;
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            Self::merge(&mut report, joined);
        }

        report.cursor = batches.cursor();
        report.elapsed = started.elapsed();

        if let Some(source) = failure {
            return Err(BatchError::Aborted {
                source,
                partial: Box::new(report),
            });
        }

        tracing::info!(
            "{} finished: {} succeeded, {} skipped, {} errors in {:.2}s",
            operation,
            report.succeeded,
            report.skipped,
            report.error_count(),
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    fn merge(report: &mut BatchReport, joined: Result<BatchOutcome, JoinError>) {
        match joined {
            Ok(outcome) => report.absorb(outcome),
            Err(e) => {
                tracing::error!("Batch task failed: {}", e);
                report.record_panic(e.to_string());
            }
        }
    }
}
