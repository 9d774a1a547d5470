//! Derived sleep metrics
//!
//! Pure helpers computing values the raw records do not store: total sleep
//! time, nap duration, the logical sleep date, and the default check-in
//! context. Absent inputs yield `None`, never an error.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::types::{CheckInContext, Nap, SleepEntry};

/// Minutes since midnight for a clock time
pub fn minutes_of_day(time: NaiveTime) -> i64 {
    (time.hour() * 60 + time.minute()) as i64
}

/// Total sleep time in minutes, from sleep onset to wake time.
///
/// Requires both times; crossing midnight adds 24 hours. The gap is not
/// checked for physical plausibility.
pub fn total_sleep_minutes(entry: &SleepEntry) -> Option<i64> {
    let onset = minutes_of_day(entry.sleep_onset?);
    let wake = minutes_of_day(entry.wake_time?);

    if wake < onset {
        Some(wake + 24 * 60 - onset)
    } else {
        Some(wake - onset)
    }
}

/// Nap duration in minutes, end minus start on the same calendar day.
///
/// No midnight wrap is applied: a nap logged as crossing midnight yields a
/// negative duration. See [`nap_duration_wrapped`] for the corrected form.
pub fn nap_duration(nap: &Nap) -> i64 {
    minutes_of_day(nap.end) - minutes_of_day(nap.start)
}

/// Nap duration with the midnight wrap applied, mirroring
/// [`total_sleep_minutes`]. Not used by the built-in aggregates, which keep
/// the same-day reading of [`nap_duration`].
pub fn nap_duration_wrapped(nap: &Nap) -> i64 {
    let raw = nap_duration(nap);
    if raw < 0 {
        raw + 24 * 60
    } else {
        raw
    }
}

/// The calendar date a night's sleep is attributed to.
///
/// Before local noon the night belongs to yesterday, so sleep reported after
/// midnight but before noon lands on the previous day.
pub fn logical_sleep_date(now: NaiveDateTime) -> NaiveDate {
    if now.hour() < 12 {
        now.date() - Duration::days(1)
    } else {
        now.date()
    }
}

/// Default check-in context for a local hour:
/// Morning before 11:00, Midday before 16:00, Evening otherwise.
pub fn auto_detect_context(hour: u32) -> CheckInContext {
    if hour < 11 {
        CheckInContext::Morning
    } else if hour < 16 {
        CheckInContext::Midday
    } else {
        CheckInContext::Evening
    }
}

/// Format minutes as "7h 45m"; `None` renders an em-dash placeholder.
pub fn format_minutes_hm(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) => format!("{}h {}m", m / 60, m % 60),
        None => "\u{2014}".to_string(),
    }
}
