//! Heraclitus Temporal Confidence Model
//!
//! Re-evaluates the credibility of each claim as it ages, as replications
//! succeed or fail, and as it is cited.
//!
//! # Overview
//!
//! - [`decay`]: the pure confidence formula, with a full [`DecayBreakdown`]
//! - [`replication`]: the replication state machine
//! - [`lifecycle`]: active / aging / superseded / retracted classification
//! - [`paradigm`]: confidence-collapse and replication-crisis detection
//! - [`TemporalConfidenceModel`]: store-backed operations, including the
//!   batched `decay_all_claims`
//!
//! Every tunable constant lives in [`TemporalConfig`].

#![warn(missing_docs)]

pub mod config;
pub mod decay;
pub mod lifecycle;
pub mod paradigm;
pub mod replication;

mod error;
mod model;
mod state;
mod stats;

pub use config::{HalfLifeTable, ParadigmConfig, TemporalConfig, DEFAULT_WINDOW_DAYS};
pub use decay::{decay, DecayBreakdown};
pub use error::TemporalError;
pub use model::TemporalConfidenceModel;
pub use state::TemporalState;
pub use stats::{AgeBucket, AgeBucketStats, TemporalStats};
