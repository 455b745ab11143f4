//! Paradigm-shift detection
//!
//! Claims first seen inside a trailing window are grouped by domain tag and by
//! fixed-width time bucket. Two kinds of cluster are flagged:
//!
//! - **Confidence collapse**: claims that lost markedly more confidence than
//!   plain age decay explains (one-sample t-test on the excess drop).
//! - **Replication crisis**: a burst of adverse replication events in a domain
//!   coinciding with a burst of new claims superseding older ones.
//!
//! Detection is pure over the claims and events handed in; persistence is the
//! caller's concern.

use crate::decay::{decay, natural_decay};
use crate::TemporalConfig;
use heraclitus_domain::time::{days_before, SECONDS_PER_DAY};
use heraclitus_domain::{Claim, ClaimId, PatternId, PatternType, ReplicationEvent, TemporalPattern};
use std::collections::{BTreeMap, BTreeSet};

/// Domain tag and bucket index
type BucketKey = (String, u64);

/// Per-domain, per-bucket pattern detector for one window
#[derive(Debug, Clone)]
pub struct ShiftDetector<'a> {
    config: &'a TemporalConfig,
    window_days: u64,
    window_start: u64,
    now: u64,
}

impl<'a> ShiftDetector<'a> {
    /// Detector for the `window_days` preceding `now`
    pub fn new(config: &'a TemporalConfig, window_days: u64, now: u64) -> Self {
        Self {
            config,
            window_days: window_days.max(1),
            window_start: days_before(now, window_days),
            now,
        }
    }

    /// First timestamp inside the window
    pub fn window_start(&self) -> u64 {
        self.window_start
    }

    fn bucket_seconds(&self) -> u64 {
        self.config.paradigm.bucket_days.max(1) * SECONDS_PER_DAY
    }

    fn bucket_of(&self, timestamp: u64) -> Option<u64> {
        (timestamp >= self.window_start && timestamp <= self.now)
            .then(|| (timestamp - self.window_start) / self.bucket_seconds())
    }

    fn bucket_start(&self, bucket: u64) -> u64 {
        self.window_start + bucket * self.bucket_seconds()
    }

    /// Pattern confidence from cluster size and effect magnitude
    pub fn pattern_confidence(&self, cluster_size: usize, magnitude: f64) -> f64 {
        let paradigm = &self.config.paradigm;
        let size_term = 1.0 - 0.5_f64.powf(cluster_size as f64 / paradigm.min_cluster_size.max(1) as f64);
        let denominator = magnitude + paradigm.min_shift_magnitude;
        let effect_term = if denominator > 0.0 { magnitude / denominator } else { 0.0 };
        (size_term * effect_term).clamp(0.0, 1.0)
    }

    /// 1 minus the mean age of the involved claims relative to the window
    fn novelty<'c>(&self, claims: impl Iterator<Item = &'c Claim>) -> f64 {
        let (total, count) = claims.fold((0u64, 0usize), |(total, count), claim| {
            (total + claim.age_days(self.now), count + 1)
        });
        if count == 0 {
            return 0.0;
        }
        let mean_age = total as f64 / count as f64;
        (1.0 - mean_age / self.window_days as f64).clamp(0.0, 1.0)
    }

    /// Flag buckets whose claims lost more confidence than age alone explains
    pub fn confidence_collapses(&self, claims: &[Claim]) -> Vec<TemporalPattern> {
        let paradigm = &self.config.paradigm;
        let mut buckets: BTreeMap<BucketKey, Vec<(&Claim, f64)>> = BTreeMap::new();

        for claim in claims {
            let Some(bucket) = self.bucket_of(claim.first_seen) else {
                continue;
            };
            let excess = natural_decay(claim, self.now, self.config) - decay(claim, self.now, self.config);
            for domain in claim.domains.iter() {
                buckets
                    .entry((domain.to_string(), bucket))
                    .or_default()
                    .push((claim, excess));
            }
        }

        let mut patterns = Vec::new();
        for ((domain, bucket), members) in buckets {
            if members.len() < paradigm.min_cluster_size {
                continue;
            }
            let drops: Vec<f64> = members.iter().map(|(_, excess)| *excess).collect();
            let (mean, t) = t_statistic(&drops);
            if mean < paradigm.min_shift_magnitude || t < paradigm.min_t_statistic {
                continue;
            }

            tracing::info!(
                "Confidence collapse in {}: {} claims, mean excess drop {:.3} (t = {:.2})",
                domain,
                members.len(),
                mean,
                t
            );
            patterns.push(TemporalPattern {
                id: PatternId::new(),
                pattern_type: PatternType::ConfidenceCollapse,
                description: format!(
                    "{} claims in {} first seen within {} days lost {:.2} more confidence on average than age alone explains (t = {:.2})",
                    members.len(),
                    domain,
                    paradigm.bucket_days,
                    mean,
                    t
                ),
                domain,
                confidence: self.pattern_confidence(members.len(), mean),
                novelty_score: self.novelty(members.iter().map(|(claim, _)| *claim)),
                claims_involved: members.iter().map(|(claim, _)| claim.id).collect(),
                start_date: self.bucket_start(bucket),
                detected_at: self.now,
            });
        }
        patterns
    }

    /// Flag buckets with a burst of adverse replications and superseding claims
    ///
    /// `claims` must hold every claim an event refers to as well as the claims
    /// first seen in the window; `superseding` holds ids of claims that some
    /// other claim names as its successor.
    pub fn replication_crises(
        &self,
        events: &[ReplicationEvent],
        claims: &BTreeMap<ClaimId, Claim>,
        superseding: &BTreeSet<ClaimId>,
    ) -> Vec<TemporalPattern> {
        let paradigm = &self.config.paradigm;

        #[derive(Default)]
        struct Burst {
            events: usize,
            adverse: usize,
            involved: BTreeSet<ClaimId>,
            contradictions: usize,
        }

        let mut buckets: BTreeMap<BucketKey, Burst> = BTreeMap::new();

        for event in events {
            let (Some(bucket), Some(claim)) = (self.bucket_of(event.recorded_at), claims.get(&event.claim_id)) else {
                continue;
            };
            for domain in claim.domains.iter() {
                let burst = buckets.entry((domain.to_string(), bucket)).or_default();
                burst.events += 1;
                if event.is_adverse() {
                    burst.adverse += 1;
                    burst.involved.insert(claim.id);
                }
            }
        }

        for id in superseding {
            let Some(claim) = claims.get(id) else {
                continue;
            };
            let Some(bucket) = self.bucket_of(claim.first_seen) else {
                continue;
            };
            for domain in claim.domains.iter() {
                let burst = buckets.entry((domain.to_string(), bucket)).or_default();
                burst.contradictions += 1;
                burst.involved.insert(claim.id);
            }
        }

        let mut patterns = Vec::new();
        for ((domain, bucket), burst) in buckets {
            if burst.adverse < paradigm.min_failure_burst || burst.contradictions < paradigm.min_contradiction_burst {
                continue;
            }
            let failure_share = burst.adverse as f64 / burst.events.max(1) as f64;

            tracing::info!(
                "Replication crisis in {}: {} adverse replications, {} superseding claims",
                domain,
                burst.adverse,
                burst.contradictions
            );
            patterns.push(TemporalPattern {
                id: PatternId::new(),
                pattern_type: PatternType::ReplicationCrisis,
                description: format!(
                    "{} failed replications ({:.0}% of attempts) and {} superseding claims in {} within {} days",
                    burst.adverse,
                    failure_share * 100.0,
                    burst.contradictions,
                    domain,
                    paradigm.bucket_days
                ),
                domain,
                confidence: self.pattern_confidence(burst.involved.len(), failure_share),
                novelty_score: self.novelty(burst.involved.iter().filter_map(|id| claims.get(id))),
                claims_involved: burst.involved.into_iter().collect(),
                start_date: self.bucket_start(bucket),
                detected_at: self.now,
            });
        }
        patterns
    }
}

/// Mean and one-sample t-statistic (against zero) of `samples`
///
/// A sample with no spread gives an infinite statistic when the mean is
/// positive and zero otherwise; fewer than two samples give zero.
pub fn t_statistic(samples: &[f64]) -> (f64, f64) {
    let n = samples.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }

    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let standard_error = (variance / n as f64).sqrt();
    let t = if standard_error > 0.0 {
        mean / standard_error
    } else if mean > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    (mean, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heraclitus_domain::{ClaimType, DomainSet, ReplicationOutcome, ReplicationStatus};

    const DAY: u64 = SECONDS_PER_DAY;
    const NOW: u64 = 1_000 * DAY;

    fn claim(id: u64, domains: &[&str], first_seen_day: u64, original: f64) -> Claim {
        Claim::new(
            ClaimId::from_value(id),
            format!("claim {}", id),
            ClaimType::Empirical,
            DomainSet::new(domains.iter().copied()).unwrap(),
            original,
            first_seen_day * DAY,
        )
        .unwrap()
    }

    fn disputed(mut claim: Claim) -> Claim {
        claim.failed_replication_count = 3;
        claim.replication_status = ReplicationStatus::Disputed;
        claim
    }

    fn event(id: u64, day: u64, outcome: ReplicationOutcome) -> ReplicationEvent {
        let resulting_status = match outcome {
            ReplicationOutcome::Success => ReplicationStatus::Successful,
            ReplicationOutcome::Partial => ReplicationStatus::Partial,
            ReplicationOutcome::Failure => ReplicationStatus::Failed,
        };
        ReplicationEvent {
            claim_id: ClaimId::from_value(id),
            outcome,
            resulting_status,
            recorded_at: day * DAY,
        }
    }

    #[test]
    fn test_t_statistic() {
        let (mean, t) = t_statistic(&[1.0, 2.0, 3.0]);
        assert!((mean - 2.0).abs() < 1e-12);
        assert!((t - 2.0 / (1.0 / 3.0_f64.sqrt())).abs() < 1e-9);

        assert_eq!(t_statistic(&[0.5, 0.5]).1, f64::INFINITY);
        assert_eq!(t_statistic(&[0.0, 0.0]).1, 0.0);
        assert_eq!(t_statistic(&[0.4]), (0.4, 0.0));
        assert_eq!(t_statistic(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_collapse_of_disputed_cluster_is_flagged() {
        let config = TemporalConfig::default();
        let detector = ShiftDetector::new(&config, 365, NOW);
        let claims = vec![
            disputed(claim(1, &["psychology"], 940, 0.9)),
            disputed(claim(2, &["psychology"], 942, 0.85)),
            disputed(claim(3, &["psychology"], 945, 0.8)),
            claim(4, &["physics"], 940, 0.9),
        ];

        let patterns = detector.confidence_collapses(&claims);
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.pattern_type, PatternType::ConfidenceCollapse);
        assert_eq!(pattern.domain, "psychology");
        assert_eq!(
            pattern.claims_involved,
            vec![ClaimId::from_value(1), ClaimId::from_value(2), ClaimId::from_value(3)]
        );
        assert!(pattern.confidence > 0.0 && pattern.confidence <= 1.0);
        assert!(pattern.novelty_score > 0.8);
        assert!(pattern.start_date <= 940 * DAY);
        assert_eq!(pattern.detected_at, NOW);
    }

    #[test]
    fn test_ordinary_decay_is_not_a_collapse() {
        let config = TemporalConfig::default();
        let detector = ShiftDetector::new(&config, 365, NOW);
        let claims: Vec<Claim> = (1..=5).map(|i| claim(i, &["chemistry"], 700, 0.9)).collect();
        assert!(detector.confidence_collapses(&claims).is_empty());
    }

    #[test]
    fn test_small_or_old_clusters_are_ignored() {
        let config = TemporalConfig::default();
        let detector = ShiftDetector::new(&config, 365, NOW);
        let claims = vec![
            disputed(claim(1, &["psychology"], 940, 0.9)),
            disputed(claim(2, &["psychology"], 941, 0.9)),
            disputed(claim(3, &["psychology"], 100, 0.9)),
        ];
        assert!(detector.confidence_collapses(&claims).is_empty());
    }

    #[test]
    fn test_replication_crisis() {
        let config = TemporalConfig::default();
        let detector = ShiftDetector::new(&config, 365, NOW);

        let mut claims = BTreeMap::new();
        for c in [
            claim(1, &["psychology"], 200, 0.8),
            claim(2, &["psychology"], 210, 0.8),
            claim(3, &["psychology"], 220, 0.8),
            claim(10, &["psychology"], 885, 0.7),
            claim(11, &["psychology"], 890, 0.7),
        ] {
            claims.insert(c.id, c);
        }
        let events = vec![
            event(1, 880, ReplicationOutcome::Failure),
            event(2, 882, ReplicationOutcome::Failure),
            event(3, 884, ReplicationOutcome::Failure),
            event(3, 886, ReplicationOutcome::Success),
        ];
        let superseding = BTreeSet::from([ClaimId::from_value(10), ClaimId::from_value(11)]);

        let patterns = detector.replication_crises(&events, &claims, &superseding);
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.pattern_type, PatternType::ReplicationCrisis);
        assert_eq!(pattern.claims_involved.len(), 5);
        assert!(pattern.description.contains("75%"));

        assert!(detector.replication_crises(&events, &claims, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_pattern_confidence_grows_with_size_and_magnitude() {
        let config = TemporalConfig::default();
        let detector = ShiftDetector::new(&config, 365, NOW);
        assert!(detector.pattern_confidence(6, 0.3) > detector.pattern_confidence(3, 0.3));
        assert!(detector.pattern_confidence(3, 0.6) > detector.pattern_confidence(3, 0.3));
        assert!((detector.pattern_confidence(3, 0.15) - 0.25).abs() < 1e-12);
    }
}
