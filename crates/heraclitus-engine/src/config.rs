//! Engine configuration loaded from TOML
//!
//! ```toml
//! [temporal]
//! replication_boost = 1.5
//!
//! [temporal.half_lives]
//! empirical = 730.0
//!
//! [semantic]
//! index = "approximate"
//!
//! [worker]
//! interval_secs = 3600
//!
//! [store]
//! backend = "sqlite"
//! path = "heraclitus.db"
//! ```

use crate::error::ConfigError;
use heraclitus_batch::BatchConfig;
use heraclitus_domain::ValidationError;
use heraclitus_semantic::SemanticConfig;
use heraclitus_temporal::{TemporalConfig, DEFAULT_WINDOW_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database at [`StoreConfig::path`]
    #[default]
    Sqlite,
    /// Process-local store, lost on exit
    Memory,
}

/// Where claims live and how they are embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend
    /// Default: sqlite
    pub backend: StoreBackend,

    /// Database path for the SQLite backend
    /// Default: "heraclitus.db"
    pub path: PathBuf,

    /// Dimension of the built-in hash embedding provider
    /// Default: 384
    pub embedding_dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: PathBuf::from("heraclitus.db"),
            embedding_dimension: 384,
        }
    }
}

/// Maintenance worker schedule and cycle contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds between maintenance cycles
    /// Default: 3600 (1 hour)
    pub interval_secs: u64,

    /// Claims per embedding backfill batch
    /// Default: 100
    pub backfill_batch_size: usize,

    /// Upper bound on claims embedded per cycle, unbounded when absent
    pub backfill_limit: Option<usize>,

    /// Run paradigm-shift detection each cycle
    /// Default: false
    pub detect_paradigm_shifts: bool,

    /// Look-back window for paradigm-shift detection (days)
    /// Default: 365
    pub paradigm_window_days: u64,

    /// Persist cross-domain bridges each cycle
    /// Default: false
    pub discover_bridges: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            backfill_batch_size: 100,
            backfill_limit: None,
            detect_paradigm_shifts: false,
            paradigm_window_days: DEFAULT_WINDOW_DAYS,
            discover_bridges: false,
        }
    }
}

impl WorkerConfig {
    /// Interval between cycles as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Complete configuration for an [`Engine`](crate::Engine) and its worker
///
/// # Examples
///
/// ```
/// use heraclitus_engine::EngineConfig;
///
/// let config = EngineConfig::from_toml_str(
///     r#"
///     [worker]
///     interval_secs = 60
///
///     [store]
///     backend = "memory"
///     "#,
/// ).unwrap();
/// assert_eq!(config.worker.interval_secs, 60);
/// assert_eq!(config.temporal, Default::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decay, replication and paradigm parameters
    pub temporal: TemporalConfig,

    /// Similarity search and bridge parameters
    pub semantic: SemanticConfig,

    /// Batch sizing, concurrency and retries
    pub batch: BatchConfig,

    /// Maintenance worker schedule
    pub worker: WorkerConfig,

    /// Storage backend
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Frequent cycles, fast decay and large batches
    pub fn aggressive() -> Self {
        Self {
            temporal: TemporalConfig::aggressive(),
            semantic: SemanticConfig::default(),
            batch: BatchConfig::aggressive(),
            worker: WorkerConfig {
                interval_secs: 1800,
                backfill_batch_size: 500,
                detect_paradigm_shifts: true,
                discover_bridges: true,
                ..WorkerConfig::default()
            },
            store: StoreConfig::default(),
        }
    }

    /// Infrequent cycles, slow decay and small batches
    pub fn lenient() -> Self {
        Self {
            temporal: TemporalConfig::lenient(),
            semantic: SemanticConfig::default(),
            batch: BatchConfig::lenient(),
            worker: WorkerConfig {
                interval_secs: 6 * 3600,
                backfill_batch_size: 25,
                ..WorkerConfig::default()
            },
            store: StoreConfig::default(),
        }
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.temporal.validate()?;
        self.semantic.validate()?;
        self.batch.validate()?;

        if self.worker.interval_secs == 0 {
            return Err(ValidationError::InvalidArgument(
                "worker.interval_secs must be positive".to_string(),
            ));
        }
        if self.worker.backfill_batch_size == 0 {
            return Err(ValidationError::InvalidArgument(
                "worker.backfill_batch_size must be positive".to_string(),
            ));
        }
        if self.worker.paradigm_window_days == 0 {
            return Err(ValidationError::InvalidArgument(
                "worker.paradigm_window_days must be positive".to_string(),
            ));
        }
        if self.store.embedding_dimension == 0 {
            return Err(ValidationError::InvalidArgument(
                "store.embedding_dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heraclitus_semantic::IndexStrategy;

    #[test]
    fn test_presets_validate() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::aggressive().validate().is_ok());
        assert!(EngineConfig::lenient().validate().is_ok());
        assert!(EngineConfig::aggressive().worker.interval_secs < EngineConfig::default().worker.interval_secs);
        assert!(EngineConfig::lenient().worker.interval_secs > EngineConfig::default().worker.interval_secs);
    }

    #[test]
    fn test_parse_toml_sections() {
        let toml = r#"
            [temporal]
            replication_boost = 1.7

            [temporal.half_lives]
            hypothesis = 200.0

            [temporal.paradigm]
            min_cluster_size = 4

            [semantic]
            index = "approximate"
            bridge_threshold = 0.8

            [batch]
            batch_size = 50

            [worker]
            interval_secs = 120
            backfill_limit = 1000
            detect_paradigm_shifts = true

            [store]
            backend = "memory"
            embedding_dimension = 64
        "#;

        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.temporal.replication_boost, 1.7);
        assert_eq!(config.temporal.half_lives.hypothesis, 200.0);
        assert_eq!(config.temporal.half_lives.empirical, 730.0);
        assert_eq!(config.temporal.paradigm.min_cluster_size, 4);
        assert_eq!(config.semantic.index, IndexStrategy::Approximate);
        assert_eq!(config.semantic.bridge_threshold, 0.8);
        assert_eq!(config.batch.batch_size, 50);
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(config.worker.interval(), Duration::from_secs(120));
        assert_eq!(config.worker.backfill_limit, Some(1000));
        assert!(config.worker.detect_paradigm_shifts);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.embedding_dimension, 64);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("[semantic]\nbridge_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str("[worker]\ninterval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str("[store]\nbackend = \"postgres\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("/nonexistent/heraclitus.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }
}
