//! Read-only temporal projection of a claim

use crate::decay::decay_breakdown;
use crate::TemporalConfig;
use heraclitus_domain::Claim;

/// Stored claim fields combined with values derived at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalState {
    /// The stored claim
    pub claim: Claim,
    /// Whole days since `first_seen`
    pub age_days: u64,
    /// Effective half-life after replication modulation (days)
    pub half_life_days: f64,
    /// `current_confidence - original_confidence`
    pub confidence_trend: f64,
    /// Citations per month
    pub citation_velocity: f64,
    /// Confidence the decay formula gives at the projection time
    pub projected_confidence: f64,
}

impl TemporalState {
    /// Project `claim` at `now`
    pub fn project(claim: Claim, now: u64, config: &TemporalConfig) -> Self {
        let breakdown = decay_breakdown(&claim, now, config);
        Self {
            age_days: breakdown.age_days,
            half_life_days: breakdown.effective_half_life,
            confidence_trend: claim.confidence_trend(),
            citation_velocity: breakdown.citation_velocity,
            projected_confidence: breakdown.confidence,
            claim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heraclitus_domain::time::SECONDS_PER_DAY;
    use heraclitus_domain::{ClaimId, ClaimType, DomainSet};

    #[test]
    fn test_projection_fields() {
        let mut claim = Claim::new(
            ClaimId::from_value(3),
            "Microplastics accumulate in human tissue",
            ClaimType::Observational,
            DomainSet::new(["toxicology"]).unwrap(),
            0.6,
            0,
        )
        .unwrap();
        claim.current_confidence = 0.5;
        claim.citation_count = 60;
        claim.replication_count = 1;

        let state = TemporalState::project(claim, 90 * SECONDS_PER_DAY, &TemporalConfig::default());
        assert_eq!(state.age_days, 90);
        assert!((state.half_life_days - 548.0 * 1.5).abs() < 1e-9);
        assert!((state.confidence_trend + 0.1).abs() < 1e-12);
        assert!((state.citation_velocity - 20.0).abs() < 1e-12);
        assert!(state.projected_confidence < 0.6);
    }
}
