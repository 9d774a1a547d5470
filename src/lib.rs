//! Somnolog - personal sleep and alertness tracking engine
//!
//! Somnolog logs sleep, naps, Stanford Sleepiness Scale check-ins, and
//! medication intake, and evaluates interventions with fixed-split Block
//! A/B self-experiments over those logs.
//!
//! ## Modules
//!
//! - **metrics**: derived values (total sleep time, nap duration, logical
//!   sleep date, default check-in context)
//! - **aggregate**: per-day rows over an inclusive date range
//! - **experiment**: block schedules, temporal status, arm comparison
//! - **store**: record store trait and the JSON-serializable client
//! - **dashboard** / **summary**: the landing snapshot and the
//!   copy-pasteable range summary
//! - **export**: CSV, full-state JSON, and the bedtime reminder calendar

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod experiment;
pub mod export;
pub mod metrics;
pub mod store;
pub mod summary;
pub mod types;

pub use aggregate::DateRange;
pub use error::TrackerError;
pub use experiment::{
    create_block_experiment, BlockDuration, ExperimentDraft, ExperimentStatus,
};
pub use store::{MemoryStore, RecordStore};

/// Crate version embedded in exports and the CLI
pub const SOMNOLOG_VERSION: &str = env!("CARGO_PKG_VERSION");
