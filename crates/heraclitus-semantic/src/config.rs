//! Configuration for similarity search and bridge discovery

use heraclitus_domain::ValidationError;
use serde::{Deserialize, Serialize};

/// How nearest-neighbour candidates are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// Score every stored vector (reference behaviour)
    #[default]
    Exact,
    /// HNSW candidates rescored with exact cosine
    Approximate,
}

/// HNSW construction and recall parameters
///
/// - **max_connections** (M): bi-directional links per node
/// - **ef_construction**: candidate list size while building
/// - **ef_search**: candidate list size while querying
/// - **candidates**: neighbours fetched per query before exact rescoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswParams {
    /// Default: 16
    pub max_connections: usize,
    /// Default: 200
    pub ef_construction: usize,
    /// Default: 64
    pub ef_search: usize,
    /// Default: 32
    pub candidates: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 200,
            ef_search: 64,
            candidates: 32,
        }
    }
}

/// Thresholds, limits and index strategy
///
/// # Examples
///
/// ```
/// use heraclitus_semantic::{IndexStrategy, SemanticConfig};
///
/// let config = SemanticConfig::default();
/// assert_eq!(config.bridge_threshold, 0.75);
/// assert_eq!(config.index, IndexStrategy::Exact);
///
/// let config = SemanticConfig::approximate();
/// assert_eq!(config.index, IndexStrategy::Approximate);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Minimum similarity for free-text search results
    /// Default: 0.5
    pub search_threshold: f64,

    /// Minimum similarity for a cross-domain bridge
    /// Default: 0.75
    pub bridge_threshold: f64,

    /// Result count when the caller gives none
    /// Default: 10
    pub default_limit: usize,

    /// Candidate generation strategy
    /// Default: exact
    pub index: IndexStrategy,

    /// Parameters for the approximate strategy
    pub hnsw: HnswParams,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            search_threshold: 0.5,
            bridge_threshold: 0.75,
            default_limit: 10,
            index: IndexStrategy::Exact,
            hnsw: HnswParams::default(),
        }
    }
}

impl SemanticConfig {
    /// Defaults with the HNSW strategy, for large corpora
    pub fn approximate() -> Self {
        Self {
            index: IndexStrategy::Approximate,
            ..Self::default()
        }
    }

    /// Check thresholds and sizes
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_threshold(self.search_threshold)?;
        check_threshold(self.bridge_threshold)?;
        check_limit(self.default_limit)?;

        let hnsw = &self.hnsw;
        if hnsw.max_connections == 0 || hnsw.ef_construction == 0 || hnsw.ef_search == 0 || hnsw.candidates == 0 {
            return Err(ValidationError::InvalidArgument(
                "HNSW parameters must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reject thresholds outside [-1, 1] or NaN
pub fn check_threshold(threshold: f64) -> Result<(), ValidationError> {
    if (-1.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ValidationError::ThresholdOutOfRange(threshold))
    }
}

/// Reject zero result limits
pub fn check_limit(limit: usize) -> Result<(), ValidationError> {
    if limit == 0 {
        return Err(ValidationError::InvalidArgument("limit must be positive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SemanticConfig::default().validate().is_ok());
        assert!(SemanticConfig::approximate().validate().is_ok());
    }

    #[test]
    fn test_threshold_range() {
        assert!(check_threshold(-1.0).is_ok());
        assert!(check_threshold(1.0).is_ok());
        assert_eq!(check_threshold(1.5), Err(ValidationError::ThresholdOutOfRange(1.5)));
        assert!(check_threshold(f64::NAN).is_err());

        let config = SemanticConfig {
            bridge_threshold: -2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&IndexStrategy::Approximate).unwrap();
        assert_eq!(json, "\"approximate\"");

        let config: SemanticConfig = serde_json::from_str(r#"{"index": "approximate", "hnsw": {"ef_search": 128}}"#).unwrap();
        assert_eq!(config.index, IndexStrategy::Approximate);
        assert_eq!(config.hnsw.ef_search, 128);
        assert_eq!(config.hnsw.candidates, 32);
        assert_eq!(config.bridge_threshold, 0.75);
    }
}
