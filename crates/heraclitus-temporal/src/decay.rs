//! Confidence decay computation
//!
//! Implements the deterministic decay formula:
//! 1. Effective half-life from the claim-type baseline and replication history
//! 2. Half-life decay of the original confidence over whole days of age
//! 3. Citation bonus recovering a bounded share of the lost confidence
//! 4. Dispute ceiling
//!
//! Every function here is pure in `(claim, now, config)`.

use crate::TemporalConfig;
use heraclitus_domain::{Claim, ReplicationStatus};

/// Every intermediate value of one decay evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct DecayBreakdown {
    /// Whole days since `first_seen`
    pub age_days: u64,
    /// Claim-type baseline half-life (days)
    pub base_half_life: f64,
    /// Half-life after replication modulation (days)
    pub effective_half_life: f64,
    /// `0.5 ^ (age_days / effective_half_life)`
    pub decay_factor: f64,
    /// `original_confidence * decay_factor`
    pub decayed: f64,
    /// Citations per month
    pub citation_velocity: f64,
    /// Share of the lost confidence recovered by citations
    pub citation_bonus: f64,
    /// Whether the dispute ceiling applied
    pub dispute_capped: bool,
    /// Final confidence in [0, 1]
    pub confidence: f64,
}

/// Half-life after replication modulation
///
/// `base × boost^successes × partial_boost^partials × penalty^failures`
pub fn effective_half_life(claim: &Claim, config: &TemporalConfig) -> f64 {
    let base = config.half_lives.get(claim.claim_type);
    base * config.replication_boost.powi(claim.replication_count as i32)
        * config.partial_boost.powi(claim.partial_replication_count as i32)
        * config.failure_penalty.powi(claim.failed_replication_count as i32)
}

/// Whether the claim is held under the dispute ceiling
pub fn is_dispute_capped(claim: &Claim, config: &TemporalConfig) -> bool {
    claim.replication_status == ReplicationStatus::Disputed
        || claim.failed_replication_count > config.dispute_failure_threshold
}

fn half_life_factor(age_days: u64, half_life: f64) -> f64 {
    if half_life <= 0.0 || !half_life.is_finite() {
        return if age_days == 0 { 1.0 } else { 0.0 };
    }
    0.5_f64.powf(age_days as f64 / half_life)
}

/// Full decay evaluation with intermediates
pub fn decay_breakdown(claim: &Claim, now: u64, config: &TemporalConfig) -> DecayBreakdown {
    let age_days = claim.age_days(now);
    let base_half_life = config.half_lives.get(claim.claim_type);
    let effective_half_life = effective_half_life(claim, config);

    let decay_factor = half_life_factor(age_days, effective_half_life);
    let original = claim.original_confidence;
    let decayed = original * decay_factor;

    let citation_velocity = claim.citation_velocity(now);
    let citation_bonus = (config.citation_weight * citation_velocity.ln_1p())
        .min(config.citation_cap)
        .max(0.0);
    let mut confidence = decayed + citation_bonus * (original - decayed);

    let dispute_capped = is_dispute_capped(claim, config);
    if dispute_capped {
        confidence = confidence.min(config.dispute_ceiling);
    }

    DecayBreakdown {
        age_days,
        base_half_life,
        effective_half_life,
        decay_factor,
        decayed,
        citation_velocity,
        citation_bonus,
        dispute_capped,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// Confidence of `claim` evaluated at `now`
///
/// # Examples
///
/// ```
/// use heraclitus_domain::{Claim, ClaimId, ClaimType, DomainSet};
/// use heraclitus_domain::time::SECONDS_PER_DAY;
/// use heraclitus_temporal::{decay, TemporalConfig};
///
/// let claim = Claim::new(
///     ClaimId::from_value(1),
///     "Working memory holds seven items",
///     ClaimType::Hypothesis,
///     DomainSet::new(["psychology"]).unwrap(),
///     0.8,
///     0,
/// ).unwrap();
///
/// // One half-life (365 days for hypotheses) halves the confidence
/// let confidence = decay(&claim, 365 * SECONDS_PER_DAY, &TemporalConfig::default());
/// assert!((confidence - 0.4).abs() < 1e-9);
/// ```
pub fn decay(claim: &Claim, now: u64, config: &TemporalConfig) -> f64 {
    decay_breakdown(claim, now, config).confidence
}

/// Plain age decay with the baseline half-life, ignoring replications,
/// citations and disputes
pub fn natural_decay(claim: &Claim, now: u64, config: &TemporalConfig) -> f64 {
    let base = config.half_lives.get(claim.claim_type);
    (claim.original_confidence * half_life_factor(claim.age_days(now), base)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heraclitus_domain::time::SECONDS_PER_DAY;
    use heraclitus_domain::{ClaimId, ClaimType, DomainSet};
    use proptest::prelude::*;

    const DAY: u64 = SECONDS_PER_DAY;

    fn claim(claim_type: ClaimType, original: f64) -> Claim {
        Claim::new(
            ClaimId::from_value(1),
            "Dietary fat causes heart disease",
            claim_type,
            DomainSet::new(["nutrition"]).unwrap(),
            original,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_claim_keeps_original() {
        let config = TemporalConfig::default();
        let c = claim(ClaimType::Empirical, 0.7);
        assert_eq!(decay(&c, 0, &config), 0.7);
        assert_eq!(decay(&c, DAY - 1, &config), 0.7);
    }

    #[test]
    fn test_one_half_life_halves_confidence() {
        let config = TemporalConfig::default();
        let c = claim(ClaimType::Empirical, 0.8);
        let result = decay(&c, 730 * DAY, &config);
        assert!((result - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_claim_from_the_future_is_not_decayed() {
        let config = TemporalConfig::default();
        let mut c = claim(ClaimType::Empirical, 0.6);
        c.first_seen = 100 * DAY;
        assert_eq!(decay(&c, 10 * DAY, &config), 0.6);
    }

    #[test]
    fn test_replication_modulates_half_life() {
        let config = TemporalConfig::default();
        let mut c = claim(ClaimType::Empirical, 0.8);
        c.replication_count = 2;
        c.partial_replication_count = 1;
        c.failed_replication_count = 1;
        let expected = 730.0 * 1.5 * 1.5 * 1.2 * 0.6;
        assert!((effective_half_life(&c, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_citation_bonus_recovers_bounded_share() {
        let config = TemporalConfig::default();
        let mut c = claim(ClaimType::Empirical, 0.8);
        let plain = decay(&c, 730 * DAY, &config);

        c.citation_count = 10_000;
        let breakdown = decay_breakdown(&c, 730 * DAY, &config);
        assert_eq!(breakdown.citation_bonus, config.citation_cap);
        assert!(breakdown.confidence > plain);
        assert!((breakdown.confidence - (0.4 + 0.25 * 0.4)).abs() < 1e-12);
        assert!(breakdown.confidence < 0.8);
    }

    #[test]
    fn test_dispute_ceiling() {
        let config = TemporalConfig::default();
        let mut c = claim(ClaimType::Theoretical, 0.95);
        c.replication_status = ReplicationStatus::Disputed;
        let breakdown = decay_breakdown(&c, 10 * DAY, &config);
        assert!(breakdown.dispute_capped);
        assert_eq!(breakdown.confidence, 0.2);

        let mut c = claim(ClaimType::Theoretical, 0.95);
        c.failed_replication_count = 3;
        assert!(decay(&c, 0, &config) <= 0.2);
    }

    #[test]
    fn test_natural_decay_ignores_history() {
        let config = TemporalConfig::default();
        let mut c = claim(ClaimType::Hypothesis, 0.8);
        c.failed_replication_count = 2;
        assert!((natural_decay(&c, 365 * DAY, &config) - 0.4).abs() < 1e-12);
        assert!(decay(&c, 365 * DAY, &config) < 0.4);
    }

    fn arb_claim() -> impl Strategy<Value = Claim> {
        (
            prop::sample::select(ClaimType::ALL.to_vec()),
            0.0f64..=1.0,
            0u32..5,
            0u32..5,
            0u32..5,
            0u64..5_000,
        )
            .prop_map(|(claim_type, original, ok, partial, failed, citations)| {
                let mut c = claim(claim_type, original);
                c.replication_count = ok;
                c.partial_replication_count = partial;
                c.failed_replication_count = failed;
                c.citation_count = citations;
                c
            })
    }

    proptest! {
        #[test]
        fn prop_confidence_in_unit_interval(c in arb_claim(), days in 0u64..20_000) {
            let result = decay(&c, days * DAY, &TemporalConfig::default());
            prop_assert!((0.0..=1.0).contains(&result));
        }

        #[test]
        fn prop_decay_is_monotonic_in_age(c in arb_claim(), a in 0u64..10_000, b in 0u64..10_000) {
            let config = TemporalConfig::default();
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(decay(&c, later * DAY, &config) <= decay(&c, earlier * DAY, &config) + 1e-12);
        }

        #[test]
        fn prop_decay_is_deterministic(c in arb_claim(), days in 0u64..10_000) {
            let config = TemporalConfig::default();
            prop_assert_eq!(decay(&c, days * DAY, &config), decay(&c, days * DAY, &config));
        }

        #[test]
        fn prop_never_exceeds_original_unless_capped(c in arb_claim(), days in 0u64..10_000) {
            let result = decay(&c, days * DAY, &TemporalConfig::default());
            prop_assert!(result <= c.original_confidence + 1e-12);
        }

        #[test]
        fn prop_success_never_lowers(c in arb_claim(), days in 0u64..10_000) {
            let config = TemporalConfig::default();
            let before = decay(&c, days * DAY, &config);
            let mut boosted = c.clone();
            boosted.replication_count += 1;
            prop_assert!(decay(&boosted, days * DAY, &config) >= before - 1e-12);
        }
    }
}
