//! Core record types for the Somnolog tracking engine
//!
//! This module defines the records the store persists and the engines consume:
//! sleep entries, naps, alertness check-ins, medications and intakes,
//! experiments with their arm assignments, custom data points, and settings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

/// Time-of-day context attached to an alertness check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInContext {
    Morning,
    Midday,
    Evening,
    Other,
}

impl CheckInContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInContext::Morning => "Morning",
            CheckInContext::Midday => "Midday",
            CheckInContext::Evening => "Evening",
            CheckInContext::Other => "Other",
        }
    }
}

/// Metric an experiment is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentMetric {
    /// Mean Stanford Sleepiness Scale score among Midday check-ins
    #[serde(rename = "Midday SSS avg")]
    MiddaySssAvg,
    /// Mean 1-5 sleep quality among sleep entries
    #[serde(rename = "Sleep quality avg")]
    SleepQualityAvg,
    /// Mean total sleep time in minutes, entries with undefined TST excluded
    #[serde(rename = "TST (min)")]
    TotalSleepMinutes,
}

impl ExperimentMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentMetric::MiddaySssAvg => "Midday SSS avg",
            ExperimentMetric::SleepQualityAvg => "Sleep quality avg",
            ExperimentMetric::TotalSleepMinutes => "TST (min)",
        }
    }
}

/// Experiment design tag. Block is the only supported design: a fixed
/// contiguous split of days between the two arms, not a randomized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentDesign {
    Block,
}

/// Intervention arm within an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arm {
    A,
    B,
}

impl Arm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::A => "A",
            Arm::B => "B",
        }
    }
}

/// One night of sleep, attributed to a logical calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    /// Store-assigned id, present once persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Logical sleep date (the night's sleep reported after midnight belongs
    /// to the previous day, see [`crate::metrics::logical_sleep_date`])
    pub date: NaiveDate,
    /// Time the user went to bed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<NaiveTime>,
    /// Time the user estimates they fell asleep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_onset: Option<NaiveTime>,
    /// Time the user woke up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<NaiveTime>,
    /// Subjective sleep quality, 1-5
    pub quality: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SleepEntry {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(1..=5).contains(&self.quality) {
            return Err(TrackerError::InvalidRecord(format!(
                "sleep quality must be 1-5, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// A daytime nap on a single calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Whether the nap was planned rather than involuntary
    pub planned: bool,
    /// How refreshing the nap felt, 1-5
    pub refreshing: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Nap {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(1..=5).contains(&self.refreshing) {
            return Err(TrackerError::InvalidRecord(format!(
                "nap refreshing score must be 1-5, got {}",
                self.refreshing
            )));
        }
        Ok(())
    }
}

/// A point-in-time alertness check-in on the Stanford Sleepiness Scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub context: CheckInContext,
    /// Stanford Sleepiness Scale score, 1 (wide awake) to 7 (fighting sleep)
    pub sss: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Labels of custom data points the user tagged this check-in with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_data_points: Vec<String>,
}

impl CheckIn {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(1..=7).contains(&self.sss) {
            return Err(TrackerError::InvalidRecord(format!(
                "SSS score must be 1-7, got {}",
                self.sss
            )));
        }
        Ok(())
    }
}

/// A medication the user tracks intakes against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    /// Default dose in milligrams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_mg: Option<f64>,
    /// Scheduled intake times, if the medication is taken on a schedule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_times: Option<Vec<NaiveTime>>,
    /// Taken as needed rather than on a schedule
    pub as_needed: bool,
}

impl Medication {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidRecord(
                "medication name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single medication intake event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedIntake {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub medication_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Dose override; absent means the medication's default dose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_mg: Option<f64>,
    pub taken: bool,
}

/// A Block A/B self-experiment over a fixed date window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub metric: ExperimentMetric,
    pub start_date: NaiveDate,
    /// Inclusive end date, always start_date + duration - 1
    pub end_date: NaiveDate,
    pub design: ExperimentDesign,
    pub arm_a_desc: String,
    pub arm_b_desc: String,
}

impl Experiment {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.title.trim().is_empty() {
            return Err(TrackerError::InvalidRecord(
                "experiment title must not be empty".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(TrackerError::InvalidRecord(format!(
                "experiment end date {} precedes start date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// Assignment of one calendar date to one experiment arm.
/// Unique per (experiment, date); bulk-created with the experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub experiment_id: Uuid,
    pub date: NaiveDate,
    pub arm: Arm,
}

/// User-defined label selectable as a tag on check-ins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDataPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
}

impl CustomDataPoint {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidRecord(
                "data point name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-user settings singleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// IANA timezone name, e.g. "America/New_York"
    pub timezone: String,
    /// Daily bedtime reminder time
    pub bedtime_reminder_time: NaiveTime,
    pub bedtime_reminder_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            bedtime_reminder_time: NaiveTime::from_hms_opt(22, 30, 0)
                .expect("22:30 is a valid time"),
            bedtime_reminder_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_metric_serde_names() {
        let json = serde_json::to_string(&ExperimentMetric::MiddaySssAvg).unwrap();
        assert_eq!(json, "\"Midday SSS avg\"");

        let parsed: ExperimentMetric = serde_json::from_str("\"TST (min)\"").unwrap();
        assert_eq!(parsed, ExperimentMetric::TotalSleepMinutes);
    }

    #[test]
    fn test_sleep_entry_quality_range() {
        let entry = SleepEntry {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            bedtime: None,
            sleep_onset: None,
            wake_time: None,
            quality: 6,
            notes: None,
        };
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_check_in_sss_range() {
        let check_in = CheckIn {
            id: None,
            timestamp: Utc::now(),
            context: CheckInContext::Morning,
            sss: 8,
            notes: None,
            selected_data_points: Vec::new(),
        };
        assert!(check_in.validate().is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.timezone, "America/New_York");
        assert_eq!(
            settings.bedtime_reminder_time,
            NaiveTime::from_hms_opt(22, 30, 0).unwrap()
        );
        assert!(settings.bedtime_reminder_enabled);
    }

    #[test]
    fn test_check_in_optional_data_points_default() {
        let json = r#"{
            "timestamp": "2024-01-15T14:00:00Z",
            "context": "Midday",
            "sss": 4
        }"#;
        let check_in: CheckIn = serde_json::from_str(json).unwrap();
        assert!(check_in.selected_data_points.is_empty());
        assert!(check_in.id.is_none());
    }
}
