//! Date-bucketed aggregation
//!
//! Groups already-fetched records into per-day rows over an inclusive date
//! range: check-in SSS averages with custom data point counts, per-date
//! sleep rows, per-nap rows, and per-medication intake counts. All of it is
//! synchronous and pure; an empty input produces an empty output.

use std::collections::BTreeMap;

use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::{nap_duration, total_sleep_minutes};
use crate::types::{CheckIn, MedIntake, Nap, SleepEntry};

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The last `days` calendar dates ending at `end`, inclusive
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - Duration::days(days as i64 - 1),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterate every date in the range, ascending
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let mut current = self.start;
        let end = self.end;
        std::iter::from_fn(move || {
            if current > end {
                return None;
            }
            let date = current;
            current += Duration::days(1);
            Some(date)
        })
    }
}

/// Named lookback windows offered by the graphs view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    OneDay,
    TwoDays,
    ThreeDays,
    SevenDays,
    ThirtyDays,
    SixMonths,
    OneYear,
    All,
}

impl RangePreset {
    /// Resolve against a reference end date. Day presets subtract their
    /// nominal day count from the end date; `All` starts at 2000-01-01.
    pub fn resolve(&self, end: NaiveDate) -> DateRange {
        let start = match self {
            RangePreset::OneDay => end - Duration::days(1),
            RangePreset::TwoDays => end - Duration::days(2),
            RangePreset::ThreeDays => end - Duration::days(3),
            RangePreset::SevenDays => end - Duration::days(7),
            RangePreset::ThirtyDays => end - Duration::days(30),
            RangePreset::SixMonths => end - Months::new(6),
            RangePreset::OneYear => end - Months::new(12),
            RangePreset::All => NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap_or(end),
        };
        DateRange { start, end }
    }
}

/// One day's worth of check-ins, averaged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckInDay {
    pub date: NaiveDate,
    /// Arithmetic mean SSS across the day's check-ins
    pub avg_sss: f64,
    /// How many of the day's check-ins carried each tracked label
    pub data_point_counts: BTreeMap<String, u32>,
}

/// Group check-ins by the date portion of their timestamp and average SSS.
///
/// `tracked` selects which custom data point labels get counted; labels not
/// listed are ignored. Only dates with at least one check-in produce a row.
pub fn daily_check_ins(
    range: &DateRange,
    check_ins: &[CheckIn],
    tracked: &[String],
) -> Vec<CheckInDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&CheckIn>> = BTreeMap::new();
    for check_in in check_ins {
        let date = check_in.timestamp.date_naive();
        if range.contains(date) {
            by_date.entry(date).or_default().push(check_in);
        }
    }

    by_date
        .into_iter()
        .map(|(date, day)| {
            let avg_sss =
                day.iter().map(|c| c.sss as f64).sum::<f64>() / day.len() as f64;

            let mut data_point_counts: BTreeMap<String, u32> =
                tracked.iter().map(|label| (label.clone(), 0)).collect();
            for check_in in &day {
                for label in &check_in.selected_data_points {
                    if let Some(count) = data_point_counts.get_mut(label) {
                        *count += 1;
                    }
                }
            }

            CheckInDay {
                date,
                avg_sss,
                data_point_counts,
            }
        })
        .collect()
}

/// One sleep entry's row. Entries are one-per-date by convention, so sleep
/// is not grouped; the entry maps straight to a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepDay {
    pub date: NaiveDate,
    /// Absent when onset or wake time is missing
    pub total_sleep_minutes: Option<i64>,
    pub quality: u8,
}

pub fn daily_sleep(range: &DateRange, entries: &[SleepEntry]) -> Vec<SleepDay> {
    let mut rows: Vec<SleepDay> = entries
        .iter()
        .filter(|entry| range.contains(entry.date))
        .map(|entry| SleepDay {
            date: entry.date,
            total_sleep_minutes: total_sleep_minutes(entry),
            quality: entry.quality,
        })
        .collect();
    rows.sort_by_key(|row| row.date);
    rows
}

/// One nap's row. Multiple naps on a date each produce their own row;
/// summing happens only in the dashboard's same-day total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NapDay {
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub refreshing: u8,
}

pub fn daily_naps(range: &DateRange, naps: &[Nap]) -> Vec<NapDay> {
    let mut rows: Vec<NapDay> = naps
        .iter()
        .filter(|nap| range.contains(nap.date))
        .map(|nap| NapDay {
            date: nap.date,
            duration_minutes: nap_duration(nap),
            refreshing: nap.refreshing,
        })
        .collect();
    rows.sort_by_key(|row| row.date);
    rows
}

/// One day's intake counts for the selected medications
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedIntakeDay {
    pub date: NaiveDate,
    /// Intake count per selected medication id, zero-filled
    pub counts: BTreeMap<Uuid, u32>,
}

/// Group intakes by date, then count per medication id. Only the medications
/// in `selected` are materialized; other intakes still create the date row.
pub fn daily_med_intakes(
    range: &DateRange,
    intakes: &[MedIntake],
    selected: &[Uuid],
) -> Vec<MedIntakeDay> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<Uuid, u32>> = BTreeMap::new();
    for intake in intakes {
        let date = intake.timestamp.date_naive();
        if range.contains(date) {
            let day = by_date.entry(date).or_default();
            *day.entry(intake.medication_id).or_insert(0) += 1;
        }
    }

    by_date
        .into_iter()
        .map(|(date, all_counts)| {
            let counts = selected
                .iter()
                .map(|id| (*id, all_counts.get(id).copied().unwrap_or(0)))
                .collect();
            MedIntakeDay { date, counts }
        })
        .collect()
}

/// Total nap minutes logged on a single date (the dashboard's "today" sum).
/// Uses the unwrapped duration, so a midnight-crossing nap subtracts.
pub fn total_nap_minutes(date: NaiveDate, naps: &[Nap]) -> i64 {
    naps.iter()
        .filter(|nap| nap.date == date)
        .map(nap_duration)
        .sum()
}
