//! Block experiment scheduling and arm comparison
//!
//! An experiment splits a fixed 7- or 14-day window into two contiguous
//! arms: the first 4 (or 7) days run arm A, the remainder arm B. The split
//! is deterministic; despite the "Block" label there is no randomization.
//! Comparison averages the configured metric per arm and emits an
//! observation only past a fixed threshold, which is a heuristic and not a
//! significance test.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::aggregate::DateRange;
use crate::error::TrackerError;
use crate::metrics::total_sleep_minutes;
use crate::store::RecordStore;
use crate::types::{
    Arm, ArmAssignment, CheckIn, CheckInContext, Experiment, ExperimentDesign,
    ExperimentMetric, SleepEntry,
};

/// Minimum absolute arm difference that produces an observation for the
/// score-scaled metrics (SSS, sleep quality)
pub const SCORE_OBSERVATION_THRESHOLD: f64 = 0.5;

/// Minimum absolute arm difference that produces an observation for the
/// minute-scaled metric (TST)
pub const MINUTES_OBSERVATION_THRESHOLD: f64 = 45.0;

impl ExperimentMetric {
    /// Observation threshold on this metric's scale
    pub fn observation_threshold(&self) -> f64 {
        match self {
            ExperimentMetric::MiddaySssAvg | ExperimentMetric::SleepQualityAvg => {
                SCORE_OBSERVATION_THRESHOLD
            }
            ExperimentMetric::TotalSleepMinutes => MINUTES_OBSERVATION_THRESHOLD,
        }
    }
}

/// Temporal status of an experiment, computed from today's date, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExperimentStatus {
    Upcoming,
    Active,
    Completed,
}

impl ExperimentStatus {
    pub fn of(experiment: &Experiment, today: NaiveDate) -> Self {
        if today < experiment.start_date {
            ExperimentStatus::Upcoming
        } else if today <= experiment.end_date {
            ExperimentStatus::Active
        } else {
            ExperimentStatus::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Upcoming => "Upcoming",
            ExperimentStatus::Active => "Active",
            ExperimentStatus::Completed => "Completed",
        }
    }
}

/// Supported block lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDuration {
    /// 7 days: 4 on arm A, 3 on arm B
    Seven,
    /// 14 days: 7 on arm A, 7 on arm B
    Fourteen,
}

impl BlockDuration {
    pub fn days(self) -> i64 {
        match self {
            BlockDuration::Seven => 7,
            BlockDuration::Fourteen => 14,
        }
    }

    /// Number of leading days assigned to arm A
    pub fn arm_a_days(self) -> i64 {
        match self {
            BlockDuration::Seven => 4,
            BlockDuration::Fourteen => 7,
        }
    }

    /// Inclusive end date: start + duration - 1
    pub fn end_date(self, start: NaiveDate) -> NaiveDate {
        start + Duration::days(self.days() - 1)
    }
}

/// The deterministic day-to-arm schedule for a block experiment:
/// one (date, arm) pair per day in [start, start + duration - 1].
pub fn block_schedule(start: NaiveDate, duration: BlockDuration) -> Vec<(NaiveDate, Arm)> {
    (0..duration.days())
        .map(|day| {
            let arm = if day < duration.arm_a_days() {
                Arm::A
            } else {
                Arm::B
            };
            (start + Duration::days(day), arm)
        })
        .collect()
}

/// Fields the user supplies when creating an experiment; dates and design
/// are derived from the chosen duration.
#[derive(Debug, Clone)]
pub struct ExperimentDraft {
    pub title: String,
    pub goal: Option<String>,
    pub metric: ExperimentMetric,
    pub start_date: NaiveDate,
    pub arm_a_desc: String,
    pub arm_b_desc: String,
}

/// Create a block experiment together with its full arm schedule.
///
/// The experiment record and every assignment go to the store in a single
/// combined insert, so a failure leaves neither behind.
pub fn create_block_experiment(
    store: &mut dyn RecordStore,
    draft: ExperimentDraft,
    duration: BlockDuration,
) -> Result<Experiment, TrackerError> {
    let experiment = Experiment {
        id: None,
        title: draft.title,
        goal: draft.goal,
        metric: draft.metric,
        start_date: draft.start_date,
        end_date: duration.end_date(draft.start_date),
        design: ExperimentDesign::Block,
        arm_a_desc: draft.arm_a_desc,
        arm_b_desc: draft.arm_b_desc,
    };
    let schedule = block_schedule(draft.start_date, duration);
    store.insert_experiment_with_assignments(experiment, &schedule)
}

/// An emitted arm difference worth mentioning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// The arm with the higher metric value
    pub favored: Arm,
    pub difference: f64,
}

/// Per-arm averages of an experiment's metric over a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmComparison {
    pub metric: ExperimentMetric,
    pub arm_a: f64,
    pub arm_b: f64,
    /// Present only when the absolute difference clears the metric's threshold
    pub observation: Option<Observation>,
}

/// Compare the experiment's arms over `range`.
///
/// Assignment dates are restricted to the requested range; each arm's value
/// is the mean of the configured metric over records falling on that arm's
/// dates. An arm with no qualifying records reports 0, never a division by
/// an empty count.
pub fn compare_arms(
    experiment: &Experiment,
    assignments: &[ArmAssignment],
    range: &DateRange,
    check_ins: &[CheckIn],
    sleep_entries: &[SleepEntry],
) -> ArmComparison {
    let arm_dates = |arm: Arm| -> HashSet<NaiveDate> {
        assignments
            .iter()
            .filter(|a| Some(a.experiment_id) == experiment.id)
            .filter(|a| a.arm == arm && range.contains(a.date))
            .map(|a| a.date)
            .collect()
    };

    let dates_a = arm_dates(Arm::A);
    let dates_b = arm_dates(Arm::B);

    let arm_a = metric_average(experiment.metric, &dates_a, check_ins, sleep_entries);
    let arm_b = metric_average(experiment.metric, &dates_b, check_ins, sleep_entries);

    let difference = (arm_a - arm_b).abs();
    let observation = if difference >= experiment.metric.observation_threshold() {
        Some(Observation {
            favored: if arm_a > arm_b { Arm::A } else { Arm::B },
            difference,
        })
    } else {
        None
    };

    ArmComparison {
        metric: experiment.metric,
        arm_a,
        arm_b,
        observation,
    }
}

fn metric_average(
    metric: ExperimentMetric,
    dates: &HashSet<NaiveDate>,
    check_ins: &[CheckIn],
    sleep_entries: &[SleepEntry],
) -> f64 {
    let values: Vec<f64> = match metric {
        ExperimentMetric::MiddaySssAvg => check_ins
            .iter()
            .filter(|c| c.context == CheckInContext::Midday)
            .filter(|c| dates.contains(&c.timestamp.date_naive()))
            .map(|c| c.sss as f64)
            .collect(),
        ExperimentMetric::SleepQualityAvg => sleep_entries
            .iter()
            .filter(|s| dates.contains(&s.date))
            .map(|s| s.quality as f64)
            .collect(),
        ExperimentMetric::TotalSleepMinutes => sleep_entries
            .iter()
            .filter(|s| dates.contains(&s.date))
            .filter_map(total_sleep_minutes)
            .map(|minutes| minutes as f64)
            .collect(),
    };

    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
