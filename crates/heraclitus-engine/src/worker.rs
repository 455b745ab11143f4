//! Background worker for scheduled maintenance

use crate::config::WorkerConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::metrics::WorkerMetrics;
use heraclitus_batch::{BatchReport, CancellationToken};
use heraclitus_domain::time::unix_now;
use heraclitus_domain::traits::{ClaimStore, EmbeddingProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// What one maintenance cycle did
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Evaluation time of the cycle (unix seconds)
    pub now: u64,

    /// Confidence recomputation
    pub decay: BatchReport,

    /// Embedding backfill, absent when the cycle was cancelled during decay
    pub backfill: Option<BatchReport>,

    /// Paradigm-shift patterns persisted
    pub patterns_detected: usize,

    /// Cross-domain bridges persisted
    pub bridges_discovered: usize,

    /// Wall-clock duration
    pub elapsed: Duration,
}

impl CycleReport {
    /// Whether a stage stopped early on cancellation
    pub fn cancelled(&self) -> bool {
        self.decay.cancelled || self.backfill.as_ref().is_some_and(|b| b.cancelled)
    }
}

/// Background worker that maintains an [`Engine`] on a schedule
///
/// Each cycle recomputes confidence for every claim not yet recomputed today,
/// then embeds claims that lack a vector. Paradigm-shift detection and bridge
/// discovery run afterwards when enabled in [`WorkerConfig`].
///
/// # Examples
///
/// ```no_run
/// use heraclitus_engine::{DynEngine, EngineConfig, MaintenanceWorker};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = EngineConfig::default();
///     let engine = Arc::new(DynEngine::open(&config)?);
///     let mut worker = MaintenanceWorker::new(engine, config.worker);
///
///     // Run until Ctrl+C
///     worker.run().await;
///     Ok(())
/// }
/// ```
pub struct MaintenanceWorker<S: ClaimStore + ?Sized, P: EmbeddingProvider + ?Sized> {
    engine: Arc<Engine<S, P>>,
    config: WorkerConfig,
    metrics: WorkerMetrics,
}

impl<S, P> MaintenanceWorker<S, P>
where
    S: ClaimStore + ?Sized + 'static,
    P: EmbeddingProvider + ?Sized + 'static,
{
    /// Create a worker over `engine`
    pub fn new(engine: Arc<Engine<S, P>>, config: WorkerConfig) -> Self {
        Self {
            engine,
            config,
            metrics: WorkerMetrics::new(),
        }
    }

    /// Totals across every cycle run so far
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Run one maintenance cycle evaluated at `now`
    ///
    /// Cancellation stops the running stage at its next batch boundary and
    /// skips the remaining stages.
    pub async fn run_cycle(&mut self, now: u64, cancel: &CancellationToken) -> Result<CycleReport, EngineError> {
        match self.cycle(now, cancel).await {
            Ok(report) => {
                self.metrics.record_cycle(&report);
                Ok(report)
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    async fn cycle(&self, now: u64, cancel: &CancellationToken) -> Result<CycleReport, EngineError> {
        let started = Instant::now();
        let temporal = self.engine.temporal();
        let semantic = self.engine.semantic();

        let decay = temporal.decay_all_claims(now, cancel).await?;
        let mut report = CycleReport {
            now,
            decay,
            backfill: None,
            patterns_detected: 0,
            bridges_discovered: 0,
            elapsed: Duration::ZERO,
        };

        if !report.decay.cancelled {
            let backfill = semantic
                .embed_existing_claims(self.config.backfill_batch_size, self.config.backfill_limit, cancel)
                .await?;
            report.backfill = Some(backfill);
        }

        if !report.cancelled() && self.config.detect_paradigm_shifts {
            let patterns = temporal
                .detect_paradigm_shifts(self.config.paradigm_window_days, now)
                .await?;
            report.patterns_detected = patterns.len();
        }

        if !report.cancelled() && !cancel.is_cancelled() && self.config.discover_bridges {
            let bridges = semantic.discover_bridges(None, None, now).await?;
            report.bridges_discovered = bridges.len();
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    async fn tick(&mut self, label: &str, cancel: &CancellationToken) {
        tracing::debug!("Starting maintenance cycle {}", label);

        match self.run_cycle(unix_now(), cancel).await {
            Ok(report) => {
                tracing::info!(
                    "Cycle {} completed: {} decayed, {} embedded, {} patterns, {} bridges",
                    label,
                    report.decay.succeeded,
                    report.backfill.as_ref().map_or(0, |b| b.succeeded),
                    report.patterns_detected,
                    report.bridges_discovered
                );
                if report.cancelled() {
                    tracing::info!("Cycle {} cancelled before completion", label);
                }
            }
            Err(e) => {
                tracing::error!("Maintenance cycle {} failed: {}", label, e);
            }
        }
    }

    /// Run until Ctrl+C
    pub async fn run(&mut self) {
        let cancel = CancellationToken::new();
        let signal = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received, stopping maintenance worker");
                        cancel.cancel();
                    }
                    Err(e) => tracing::error!("Unable to listen for shutdown signal: {}", e),
                }
            })
        };

        self.run_until(&cancel).await;
        signal.abort();
    }

    /// Run at the configured interval until `cancel` fires
    pub async fn run_until(&mut self, cancel: &CancellationToken) {
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Maintenance worker started (interval: {:?})", self.config.interval());

        let mut cycle = 0usize;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle += 1;
                    self.tick(&cycle.to_string(), cancel).await;
                    if cancel.is_cancelled() {
                        break;
                    }
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }

        tracing::info!("Maintenance worker stopped. Final metrics:\n{}", self.metrics.summary());
    }

    /// Run a fixed number of cycles at the configured interval
    pub async fn run_cycles(&mut self, cycles: usize, cancel: &CancellationToken) {
        let mut ticker = interval(self.config.interval());

        tracing::info!(
            "Maintenance worker started for {} cycles (interval: {:?})",
            cycles,
            self.config.interval()
        );

        for cycle in 0..cycles {
            if cancel.is_cancelled() {
                break;
            }
            ticker.tick().await;
            self.tick(&format!("{}/{}", cycle + 1, cycles), cancel).await;
        }

        tracing::info!("Maintenance worker finished. Final metrics:\n{}", self.metrics.summary());
    }
}
