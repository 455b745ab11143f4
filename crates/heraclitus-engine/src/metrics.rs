//! Metrics accumulated across maintenance cycles

use crate::worker::CycleReport;
use std::time::Duration;

/// Running totals for a [`MaintenanceWorker`](crate::MaintenanceWorker)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerMetrics {
    /// Cycles that ran to completion
    pub cycles_completed: usize,

    /// Cycles that stopped on a systemic error
    pub cycles_failed: usize,

    /// Claims whose confidence was recomputed
    pub claims_decayed: usize,

    /// Claims that received an embedding
    pub claims_embedded: usize,

    /// Per-item failures reported by bulk operations
    pub item_errors: usize,

    /// Paradigm-shift patterns persisted
    pub patterns_detected: usize,

    /// Cross-domain bridges persisted
    pub bridges_discovered: usize,

    /// Time spent inside cycles
    pub total_runtime: Duration,
}

impl WorkerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished cycle into the totals
    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.cycles_completed += 1;
        self.claims_decayed += report.decay.succeeded;
        self.item_errors += report.decay.error_count();
        if let Some(backfill) = &report.backfill {
            self.claims_embedded += backfill.succeeded;
            self.item_errors += backfill.error_count();
        }
        self.patterns_detected += report.patterns_detected;
        self.bridges_discovered += report.bridges_discovered;
        self.total_runtime += report.elapsed;
    }

    /// Record a cycle that aborted
    pub fn record_failure(&mut self) {
        self.cycles_failed += 1;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Maintenance Metrics Summary".to_string(),
            "===========================".to_string(),
            format!("Cycles completed: {}", self.cycles_completed),
            format!("Cycles failed: {}", self.cycles_failed),
            format!("Claims decayed: {}", self.claims_decayed),
            format!("Claims embedded: {}", self.claims_embedded),
            format!("Item errors: {}", self.item_errors),
            format!("Patterns detected: {}", self.patterns_detected),
            format!("Bridges discovered: {}", self.bridges_discovered),
            format!("Runtime: {:.2}s", self.total_runtime.as_secs_f64()),
        ]
        .join("\n")
    }
}
