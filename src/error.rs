//! Error types for Somnolog

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during store access or export
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Not authenticated: {0} requires a signed-in user")]
    NotAuthenticated(&'static str),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Arm assignment already exists for experiment {experiment_id} on {date}")]
    DuplicateAssignment {
        experiment_id: Uuid,
        date: NaiveDate,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid time (expected HH:MM): {0}")]
    InvalidTimeFormat(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
