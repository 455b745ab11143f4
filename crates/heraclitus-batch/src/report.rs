//! Outcome accounting for bulk operations

use crate::BatchError;
use heraclitus_domain::{ClaimId, EmbeddingError, StoreError, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Classification of a per-item failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemErrorKind {
    /// The claim vanished between scan and update
    NotFound,
    /// The row failed validation and was skipped
    Malformed,
    /// Version conflicts persisted past the retry bound
    Conflict,
    /// Any other store failure after retries
    Store,
    /// The embedding provider failed for this item
    Embedding,
    /// The batch task panicked
    Panic,
}

impl ItemErrorKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemErrorKind::NotFound => "not_found",
            ItemErrorKind::Malformed => "malformed",
            ItemErrorKind::Conflict => "conflict",
            ItemErrorKind::Store => "store",
            ItemErrorKind::Embedding => "embedding",
            ItemErrorKind::Panic => "panic",
        }
    }
}

impl fmt::Display for ItemErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure isolated to one claim (or one batch, when the claim is unknown)
#[derive(Debug, Clone, PartialEq)]
pub struct ItemError {
    /// Claim the failure belongs to
    pub claim_id: Option<ClaimId>,
    /// Failure class
    pub kind: ItemErrorKind,
    /// Human-readable cause
    pub message: String,
}

impl ItemError {
    /// Build an item error for a claim
    pub fn new(claim_id: ClaimId, kind: ItemErrorKind, message: impl Into<String>) -> Self {
        Self {
            claim_id: Some(claim_id),
            kind,
            message: message.into(),
        }
    }

    /// Classify a store failure
    pub fn from_store(claim_id: ClaimId, err: &StoreError) -> Self {
        let kind = match err {
            StoreError::NotFound(_) => ItemErrorKind::NotFound,
            StoreError::Conflict { .. } => ItemErrorKind::Conflict,
            StoreError::InvalidData(_) => ItemErrorKind::Malformed,
            _ => ItemErrorKind::Store,
        };
        Self::new(claim_id, kind, err.to_string())
    }

    /// A row that failed validation
    pub fn malformed(claim_id: ClaimId, err: &ValidationError) -> Self {
        Self::new(claim_id, ItemErrorKind::Malformed, err.to_string())
    }

    /// Classify a failed claim update
    pub fn from_batch(claim_id: ClaimId, err: &BatchError) -> Self {
        match err {
            BatchError::Store(e) => Self::from_store(claim_id, e),
            BatchError::Validation(e) => Self::malformed(claim_id, e),
            other => Self::new(claim_id, ItemErrorKind::Store, other.to_string()),
        }
    }

    /// An embedding failure for one claim
    pub fn embedding(claim_id: ClaimId, err: &EmbeddingError) -> Self {
        Self::new(claim_id, ItemErrorKind::Embedding, err.to_string())
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.claim_id {
            Some(id) => write!(f, "claim {}: {} ({})", id, self.message, self.kind),
            None => write!(f, "{} ({})", self.message, self.kind),
        }
    }
}

/// Result of processing one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Items updated
    pub succeeded: usize,
    /// Items that needed no work
    pub skipped: usize,
    /// Items that failed
    pub errors: Vec<ItemError>,
}

impl BatchOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an updated item
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record an item that needed no work
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a failed item
    pub fn record_error(&mut self, error: ItemError) {
        tracing::warn!("Skipping {}", error);
        self.errors.push(error);
    }
}

/// Aggregate report of a bulk operation
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Operation name (for logs and summaries)
    pub operation: String,
    /// Items updated
    pub succeeded: usize,
    /// Items that needed no work
    pub skipped: usize,
    /// Per-item failures
    pub errors: Vec<ItemError>,
    /// Batches that ran to completion
    pub batches_completed: usize,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Last claim id handed to a batch; resume point for a later run
    pub cursor: Option<ClaimId>,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl BatchReport {
    /// Create an empty report
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            succeeded: 0,
            skipped: 0,
            errors: Vec::new(),
            batches_completed: 0,
            cancelled: false,
            cursor: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Merge a completed batch
    pub fn absorb(&mut self, outcome: BatchOutcome) {
        self.succeeded += outcome.succeeded;
        self.skipped += outcome.skipped;
        self.errors.extend(outcome.errors);
        self.batches_completed += 1;
    }

    /// Record a batch whose task panicked
    pub fn record_panic(&mut self, message: impl Into<String>) {
        self.errors.push(ItemError {
            claim_id: None,
            kind: ItemErrorKind::Panic,
            message: message.into(),
        });
    }

    /// Items seen: succeeded, skipped or failed
    pub fn total_processed(&self) -> usize {
        self.succeeded + self.skipped + self.errors.len()
    }

    /// Number of per-item failures
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Failures grouped by kind
    pub fn errors_by_kind(&self) -> BTreeMap<ItemErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.errors {
            *counts.entry(error.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether the run completed with no failures and no cancellation
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Batch Report: {}", self.operation),
            "======================".to_string(),
            format!("Succeeded: {}", self.succeeded),
            format!("Skipped: {}", self.skipped),
            format!("Errors: {}", self.errors.len()),
            format!("Batches: {}", self.batches_completed),
            format!("Elapsed: {:.2}s", self.elapsed.as_secs_f64()),
        ];

        if self.cancelled {
            match self.cursor {
                Some(cursor) => lines.push(format!("Cancelled; resume after claim {}", cursor)),
                None => lines.push("Cancelled before the first batch".to_string()),
            }
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors by kind:".to_string());
            for (kind, count) in self.errors_by_kind() {
                lines.push(format!("  {}: {}", kind, count));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = BatchReport::new("decay");
        assert_eq!(report.total_processed(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_absorb_outcomes() {
        let mut report = BatchReport::new("decay");

        let mut first = BatchOutcome::new();
        first.record_success();
        first.record_success();
        first.record_skip();
        report.absorb(first);

        let mut second = BatchOutcome::new();
        second.record_error(ItemError::from_store(
            ClaimId::from_value(4),
            &StoreError::NotFound(ClaimId::from_value(4)),
        ));
        report.absorb(second);

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.batches_completed, 2);
        assert_eq!(report.total_processed(), 4);
        assert!(!report.is_clean());
        assert_eq!(report.errors_by_kind()[&ItemErrorKind::NotFound], 1);
    }

    #[test]
    fn test_store_error_classification() {
        let id = ClaimId::from_value(1);
        let conflict = StoreError::Conflict { id, expected: 2 };
        assert_eq!(ItemError::from_store(id, &conflict).kind, ItemErrorKind::Conflict);
        let bad = StoreError::InvalidData("bad blob".into());
        assert_eq!(ItemError::from_store(id, &bad).kind, ItemErrorKind::Malformed);
        let down = StoreError::Transient("busy".into());
        assert_eq!(ItemError::from_store(id, &down).kind, ItemErrorKind::Store);
    }

    #[test]
    fn test_summary_format() {
        let mut report = BatchReport::new("embed");
        report.succeeded = 10;
        report.cancelled = true;
        report.cursor = Some(ClaimId::from_value(99));
        report.record_panic("task panicked");

        let summary = report.summary();
        assert!(summary.contains("Batch Report: embed"));
        assert!(summary.contains("Succeeded: 10"));
        assert!(summary.contains("resume after claim 99"));
        assert!(summary.contains("panic: 1"));
    }
}
