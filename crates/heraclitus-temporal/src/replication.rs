//! Replication state machine

use crate::TemporalConfig;
use heraclitus_domain::{Claim, ReplicationOutcome, ReplicationStatus};

/// Next replication status after an outcome
///
/// `failed_after` is the failed-replication count including this outcome.
/// Any failure that takes the count above `dispute_threshold` disputes the claim;
/// a disputed claim never leaves that state through this function.
///
/// ```
/// use heraclitus_domain::{ReplicationOutcome, ReplicationStatus};
/// use heraclitus_temporal::replication::next_status;
///
/// let next = next_status(ReplicationStatus::Failed, ReplicationOutcome::Success, 1, 2);
/// assert_eq!(next, ReplicationStatus::Partial);
///
/// let next = next_status(ReplicationStatus::Failed, ReplicationOutcome::Failure, 3, 2);
/// assert_eq!(next, ReplicationStatus::Disputed);
/// ```
pub fn next_status(
    current: ReplicationStatus,
    outcome: ReplicationOutcome,
    failed_after: u32,
    dispute_threshold: u32,
) -> ReplicationStatus {
    use ReplicationOutcome as O;
    use ReplicationStatus as S;

    if current == S::Disputed {
        return S::Disputed;
    }
    if outcome == O::Failure && failed_after > dispute_threshold {
        return S::Disputed;
    }

    match (current, outcome) {
        (S::Successful, _) => S::Successful,
        (S::Failed, O::Success) | (S::Failed, O::Partial) => S::Partial,
        (_, O::Success) => S::Successful,
        (_, O::Partial) => S::Partial,
        (_, O::Failure) => S::Failed,
    }
}

/// Apply an outcome to a claim's counters, status and `last_confirmed`
///
/// Confidence is left to the caller to recompute.
pub fn apply_outcome(claim: &mut Claim, outcome: ReplicationOutcome, now: u64, config: &TemporalConfig) {
    match outcome {
        ReplicationOutcome::Success => {
            claim.replication_count = claim.replication_count.saturating_add(1);
            claim.last_confirmed = Some(now);
        }
        ReplicationOutcome::Partial => {
            claim.partial_replication_count = claim.partial_replication_count.saturating_add(1);
        }
        ReplicationOutcome::Failure => {
            claim.failed_replication_count = claim.failed_replication_count.saturating_add(1);
        }
    }

    claim.replication_status = next_status(
        claim.replication_status,
        outcome,
        claim.failed_replication_count,
        config.dispute_failure_threshold,
    );
}
