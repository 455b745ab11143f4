//! Configuration for the temporal confidence model
//!
//! Every constant of the decay formula, the replication state machine and the
//! paradigm-shift detector lives here and is passed in at construction.

use heraclitus_domain::{ClaimType, ValidationError};
use serde::{Deserialize, Serialize};

/// Default trailing window for paradigm-shift detection (days)
pub const DEFAULT_WINDOW_DAYS: u64 = 365;

/// Baseline half-life per claim type, in days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalfLifeTable {
    /// Default: 730 days
    pub empirical: f64,
    /// Default: 1825 days
    pub theoretical: f64,
    /// Default: 1095 days
    pub methodological: f64,
    /// Default: 548 days
    pub observational: f64,
    /// Default: 365 days
    pub hypothesis: f64,
    /// Default: 1460 days
    pub meta_analysis: f64,
}

impl Default for HalfLifeTable {
    fn default() -> Self {
        Self {
            empirical: 730.0,
            theoretical: 1825.0,
            methodological: 1095.0,
            observational: 548.0,
            hypothesis: 365.0,
            meta_analysis: 1460.0,
        }
    }
}

impl HalfLifeTable {
    /// Same half-life for every claim type
    pub fn uniform(days: f64) -> Self {
        Self {
            empirical: days,
            theoretical: days,
            methodological: days,
            observational: days,
            hypothesis: days,
            meta_analysis: days,
        }
    }

    /// Scale every entry by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            empirical: self.empirical * factor,
            theoretical: self.theoretical * factor,
            methodological: self.methodological * factor,
            observational: self.observational * factor,
            hypothesis: self.hypothesis * factor,
            meta_analysis: self.meta_analysis * factor,
        }
    }

    /// Baseline half-life for a claim type
    pub fn get(&self, claim_type: ClaimType) -> f64 {
        match claim_type {
            ClaimType::Empirical => self.empirical,
            ClaimType::Theoretical => self.theoretical,
            ClaimType::Methodological => self.methodological,
            ClaimType::Observational => self.observational,
            ClaimType::Hypothesis => self.hypothesis,
            ClaimType::MetaAnalysis => self.meta_analysis,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for claim_type in ClaimType::ALL {
            let days = self.get(claim_type);
            if !days.is_finite() || days <= 0.0 {
                return Err(ValidationError::InvalidArgument(format!(
                    "half-life for {} must be positive, got {}",
                    claim_type, days
                )));
            }
        }
        Ok(())
    }
}

/// Parameters of the paradigm-shift detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParadigmConfig {
    /// Width of a time bucket inside the window (days)
    /// Default: 30
    pub bucket_days: u64,

    /// Claims needed before a bucket can be flagged
    /// Default: 3
    pub min_cluster_size: usize,

    /// Mean excess confidence drop needed to flag a collapse
    /// Default: 0.15
    pub min_shift_magnitude: f64,

    /// One-sample t-statistic of the excess drops needed to flag a collapse
    /// Default: 2.0
    pub min_t_statistic: f64,

    /// Adverse replication events in one bucket needed to flag a crisis
    /// Default: 3
    pub min_failure_burst: usize,

    /// New superseding claims in the same bucket needed to flag a crisis
    /// Default: 2
    pub min_contradiction_burst: usize,
}

impl Default for ParadigmConfig {
    fn default() -> Self {
        Self {
            bucket_days: 30,
            min_cluster_size: 3,
            min_shift_magnitude: 0.15,
            min_t_statistic: 2.0,
            min_failure_burst: 3,
            min_contradiction_burst: 2,
        }
    }
}

impl ParadigmConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.bucket_days == 0 {
            return Err(ValidationError::InvalidArgument(
                "paradigm.bucket_days must be positive".to_string(),
            ));
        }
        if self.min_cluster_size == 0 {
            return Err(ValidationError::InvalidArgument(
                "paradigm.min_cluster_size must be positive".to_string(),
            ));
        }
        if !self.min_shift_magnitude.is_finite() || self.min_shift_magnitude <= 0.0 {
            return Err(ValidationError::InvalidArgument(format!(
                "paradigm.min_shift_magnitude must be positive, got {}",
                self.min_shift_magnitude
            )));
        }
        if !self.min_t_statistic.is_finite() {
            return Err(ValidationError::InvalidArgument(
                "paradigm.min_t_statistic must be finite".to_string(),
            ));
        }
        if self.min_failure_burst == 0 {
            return Err(ValidationError::InvalidArgument(
                "paradigm.min_failure_burst must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the temporal confidence model
///
/// # Examples
///
/// ```
/// use heraclitus_temporal::TemporalConfig;
/// use heraclitus_domain::ClaimType;
///
/// let config = TemporalConfig::default();
/// assert_eq!(config.half_lives.get(ClaimType::Empirical), 730.0);
/// assert!(config.validate().is_ok());
///
/// // Faster decay, stricter dispute handling
/// let config = TemporalConfig::aggressive();
/// assert!(config.half_lives.empirical < 730.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Baseline half-life per claim type
    pub half_lives: HalfLifeTable,

    /// Half-life multiplier per successful replication (> 1)
    /// Default: 1.5
    pub replication_boost: f64,

    /// Half-life multiplier per partial replication (>= 1)
    /// Default: 1.2
    pub partial_boost: f64,

    /// Half-life multiplier per failed replication (< 1)
    /// Default: 0.6
    pub failure_penalty: f64,

    /// Failed replications tolerated before a claim is disputed
    /// Default: 2 (the third failure disputes)
    pub dispute_failure_threshold: u32,

    /// Confidence ceiling for disputed claims
    /// Default: 0.2
    pub dispute_ceiling: f64,

    /// Weight of `ln(1 + citation_velocity)` in the citation bonus
    /// Default: 0.05
    pub citation_weight: f64,

    /// Largest share of decayed confidence citations can recover (< 1)
    /// Default: 0.25
    pub citation_cap: f64,

    /// Minimum age for the aging lifecycle state (days)
    /// Default: 180
    pub aging_min_age_days: u64,

    /// Confidence below which an old claim is aging
    /// Default: 0.5
    pub aging_confidence_threshold: f64,

    /// Paradigm-shift detector parameters
    pub paradigm: ParadigmConfig,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            half_lives: HalfLifeTable::default(),
            replication_boost: 1.5,
            partial_boost: 1.2,
            failure_penalty: 0.6,
            dispute_failure_threshold: 2,
            dispute_ceiling: 0.2,
            citation_weight: 0.05,
            citation_cap: 0.25,
            aging_min_age_days: 180,
            aging_confidence_threshold: 0.5,
            paradigm: ParadigmConfig::default(),
        }
    }
}

impl TemporalConfig {
    /// Faster decay, weaker boosts, disputes after the second failure
    pub fn aggressive() -> Self {
        Self {
            half_lives: HalfLifeTable::default().scaled(0.5),
            replication_boost: 1.3,
            partial_boost: 1.1,
            failure_penalty: 0.5,
            dispute_failure_threshold: 1,
            dispute_ceiling: 0.15,
            citation_weight: 0.03,
            citation_cap: 0.15,
            aging_min_age_days: 90,
            aging_confidence_threshold: 0.6,
            paradigm: ParadigmConfig {
                min_shift_magnitude: 0.1,
                min_t_statistic: 1.5,
                ..ParadigmConfig::default()
            },
        }
    }

    /// Slower decay, stronger boosts, more tolerance for failed replications
    pub fn lenient() -> Self {
        Self {
            half_lives: HalfLifeTable::default().scaled(2.0),
            replication_boost: 1.8,
            partial_boost: 1.3,
            failure_penalty: 0.75,
            dispute_failure_threshold: 4,
            dispute_ceiling: 0.3,
            citation_weight: 0.08,
            citation_cap: 0.35,
            aging_min_age_days: 365,
            aging_confidence_threshold: 0.4,
            paradigm: ParadigmConfig {
                min_cluster_size: 5,
                min_shift_magnitude: 0.2,
                min_t_statistic: 2.5,
                ..ParadigmConfig::default()
            },
        }
    }

    /// Check every parameter range
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.half_lives.validate()?;
        self.paradigm.validate()?;

        if !self.replication_boost.is_finite() || self.replication_boost < 1.0 {
            return Err(ValidationError::InvalidArgument(format!(
                "replication_boost must be >= 1, got {}",
                self.replication_boost
            )));
        }
        if !self.partial_boost.is_finite() || self.partial_boost < 1.0 {
            return Err(ValidationError::InvalidArgument(format!(
                "partial_boost must be >= 1, got {}",
                self.partial_boost
            )));
        }
        if !self.failure_penalty.is_finite() || self.failure_penalty <= 0.0 || self.failure_penalty > 1.0 {
            return Err(ValidationError::InvalidArgument(format!(
                "failure_penalty must be in (0, 1], got {}",
                self.failure_penalty
            )));
        }
        if !self.citation_weight.is_finite() || self.citation_weight < 0.0 {
            return Err(ValidationError::InvalidArgument(format!(
                "citation_weight must be non-negative, got {}",
                self.citation_weight
            )));
        }
        if !self.citation_cap.is_finite() || !(0.0..1.0).contains(&self.citation_cap) {
            return Err(ValidationError::InvalidArgument(format!(
                "citation_cap must be in [0, 1), got {}",
                self.citation_cap
            )));
        }
        check_unit("dispute_ceiling", self.dispute_ceiling)?;
        check_unit("aging_confidence_threshold", self.aging_confidence_threshold)?;
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ConfidenceOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TemporalConfig::default();
        assert_eq!(config.half_lives.get(ClaimType::Hypothesis), 365.0);
        assert_eq!(config.half_lives.get(ClaimType::MetaAnalysis), 1460.0);
        assert_eq!(config.dispute_failure_threshold, 2);
        assert_eq!(config.paradigm.bucket_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(TemporalConfig::aggressive().validate().is_ok());
        assert!(TemporalConfig::lenient().validate().is_ok());
        assert!(
            TemporalConfig::lenient().half_lives.empirical
                > TemporalConfig::default().half_lives.empirical
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = TemporalConfig { citation_cap: 1.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TemporalConfig { failure_penalty: 1.5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TemporalConfig { dispute_ceiling: f64::NAN, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ConfidenceOutOfRange { field: "dispute_ceiling", .. })
        ));

        let config = TemporalConfig { half_lives: HalfLifeTable::uniform(0.0), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = TemporalConfig::aggressive();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: TemporalConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TemporalConfig =
            serde_json::from_str(r#"{"half_lives": {"empirical": 365.0}, "dispute_ceiling": 0.1}"#).unwrap();
        assert_eq!(config.half_lives.empirical, 365.0);
        assert_eq!(config.half_lives.theoretical, 1825.0);
        assert_eq!(config.dispute_ceiling, 0.1);
        assert_eq!(config.replication_boost, 1.5);
    }
}
