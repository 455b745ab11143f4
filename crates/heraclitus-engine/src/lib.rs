//! Heraclitus engine
//!
//! Wires the temporal confidence model and the semantic bridge finder to one
//! store and one embedding provider, and runs them on a schedule.
//!
//! - [`EngineConfig`]: TOML configuration for every component
//! - [`Engine`]: facade over the store, the provider and both engines
//! - [`MaintenanceWorker`]: periodic decay, embedding backfill, paradigm
//!   detection and bridge discovery
//!
//! The `heraclitus-worker` binary runs a [`MaintenanceWorker`] against the
//! configured store.

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod metrics;
mod worker;

pub use config::{EngineConfig, StoreBackend, StoreConfig, WorkerConfig};
pub use engine::{DynEngine, Engine};
pub use error::{ConfigError, EngineError};
pub use metrics::WorkerMetrics;
pub use worker::{CycleReport, MaintenanceWorker};
