//! Lifecycle classification and confidence recomputation

use crate::decay::{decay_breakdown, DecayBreakdown};
use crate::TemporalConfig;
use heraclitus_domain::{Claim, ClaimStatus};

/// Lifecycle state implied by a claim's links, age and confidence
///
/// Retraction is sticky; a claim with a successor is superseded; an old,
/// low-confidence claim is aging; anything else is active.
pub fn classify_status(claim: &Claim, age_days: u64, confidence: f64, config: &TemporalConfig) -> ClaimStatus {
    if claim.status == ClaimStatus::Retracted {
        ClaimStatus::Retracted
    } else if claim.superseded_by.is_some() {
        ClaimStatus::Superseded
    } else if age_days >= config.aging_min_age_days && confidence < config.aging_confidence_threshold {
        ClaimStatus::Aging
    } else {
        ClaimStatus::Active
    }
}

/// Recompute `current_confidence`, `status` and `confidence_updated_at` at `now`
///
/// Counters, citation data and links are left untouched.
pub fn recompute(claim: &mut Claim, now: u64, config: &TemporalConfig) -> DecayBreakdown {
    let breakdown = decay_breakdown(claim, now, config);
    claim.current_confidence = breakdown.confidence;
    claim.status = classify_status(claim, breakdown.age_days, breakdown.confidence, config);
    claim.confidence_updated_at = Some(now);
    breakdown
}
