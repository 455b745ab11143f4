//! Corpus-wide temporal statistics

use heraclitus_domain::{Claim, ClaimStatus, ReplicationStatus};
use std::collections::BTreeMap;
use std::fmt;

/// Age band used in the statistics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    /// Under 30 days
    UnderOneMonth,
    /// 30 to 179 days
    OneToSixMonths,
    /// 180 to 364 days
    SixToTwelveMonths,
    /// 365 to 729 days
    OneToTwoYears,
    /// 730 days and older
    OverTwoYears,
}

impl AgeBucket {
    /// All buckets, youngest first
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::UnderOneMonth,
        AgeBucket::OneToSixMonths,
        AgeBucket::SixToTwelveMonths,
        AgeBucket::OneToTwoYears,
        AgeBucket::OverTwoYears,
    ];

    /// Bucket for an age in whole days
    pub fn for_age(age_days: u64) -> Self {
        match age_days {
            0..=29 => AgeBucket::UnderOneMonth,
            30..=179 => AgeBucket::OneToSixMonths,
            180..=364 => AgeBucket::SixToTwelveMonths,
            365..=729 => AgeBucket::OneToTwoYears,
            _ => AgeBucket::OverTwoYears,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UnderOneMonth => "< 1 month",
            AgeBucket::OneToSixMonths => "1-6 months",
            AgeBucket::SixToTwelveMonths => "6-12 months",
            AgeBucket::OneToTwoYears => "1-2 years",
            AgeBucket::OverTwoYears => "> 2 years",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Claim count and mean stored confidence of one age bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgeBucketStats {
    /// Claims in the bucket
    pub count: usize,
    /// Mean `current_confidence` (0 when empty)
    pub average_confidence: f64,
}

/// Distribution of replication states, lifecycle states and ages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalStats {
    /// Claims counted
    pub total: usize,
    /// Claims per replication status
    pub by_replication_status: BTreeMap<ReplicationStatus, usize>,
    /// Claims per lifecycle status
    pub by_status: BTreeMap<ClaimStatus, usize>,
    /// Count and mean confidence per age bucket
    pub by_age: BTreeMap<AgeBucket, AgeBucketStats>,
}

impl TemporalStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one claim observed at `now`
    pub fn record(&mut self, claim: &Claim, now: u64) {
        self.total += 1;
        *self.by_replication_status.entry(claim.replication_status).or_insert(0) += 1;
        *self.by_status.entry(claim.status).or_insert(0) += 1;

        let bucket = self.by_age.entry(AgeBucket::for_age(claim.age_days(now))).or_default();
        let n = bucket.count as f64;
        bucket.average_confidence = (bucket.average_confidence * n + claim.current_confidence) / (n + 1.0);
        bucket.count += 1;
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Temporal Statistics".to_string(),
            "===================".to_string(),
            format!("Total claims: {}", self.total),
            String::new(),
            "Replication status:".to_string(),
        ];
        for (status, count) in &self.by_replication_status {
            lines.push(format!("  {}: {}", status, count));
        }
        lines.push(String::new());
        lines.push("Lifecycle status:".to_string());
        for (status, count) in &self.by_status {
            lines.push(format!("  {}: {}", status, count));
        }
        lines.push(String::new());
        lines.push("Age distribution:".to_string());
        for bucket in AgeBucket::ALL {
            if let Some(stats) = self.by_age.get(&bucket) {
                lines.push(format!(
                    "  {}: {} claims, avg confidence {:.3}",
                    bucket, stats.count, stats.average_confidence
                ));
            }
        }
        lines.join("\n")
    }
}
