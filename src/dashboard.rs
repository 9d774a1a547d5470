//! Today / recent dashboard snapshot
//!
//! The landing view's numbers, computed in one pass over fetched records:
//! last night's total sleep, today's summed nap time, the latest check-in
//! score, aligned 7-day series for SSS and TST, and today's arm of the
//! active experiment.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{total_nap_minutes, DateRange};
use crate::experiment::ExperimentStatus;
use crate::metrics::total_sleep_minutes;
use crate::types::{Arm, ArmAssignment, CheckIn, Experiment, Nap, SleepEntry};

/// Today's arm of the active experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayArm {
    pub arm: Arm,
    pub experiment: Experiment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// TST of the most recent sleep entry, absent when times are missing
    pub last_night_tst: Option<i64>,
    /// Sum of today's nap durations in minutes
    pub today_nap_minutes: i64,
    /// SSS of the most recent check-in
    pub latest_sss: Option<u8>,
    /// Average SSS per day over the trailing week, oldest first; 0 for
    /// days without check-ins, rounded to one decimal
    pub avg_sss_7d: Vec<f64>,
    /// TST per day over the trailing week, oldest first; 0 when absent
    pub tst_7d: Vec<i64>,
    pub today_arm: Option<TodayArm>,
}

impl DashboardSnapshot {
    pub fn build(
        today: NaiveDate,
        sleep_entries: &[SleepEntry],
        naps: &[Nap],
        check_ins: &[CheckIn],
        experiments: &[Experiment],
        assignments: &[ArmAssignment],
    ) -> Self {
        let last_night_tst = sleep_entries
            .iter()
            .max_by_key(|entry| entry.date)
            .and_then(total_sleep_minutes);

        let today_nap_minutes = total_nap_minutes(today, naps);

        let latest_sss = check_ins
            .iter()
            .max_by_key(|check_in| check_in.timestamp)
            .map(|check_in| check_in.sss);

        let week = DateRange::trailing_days(today, 7);
        let avg_sss_7d = week
            .dates()
            .map(|date| {
                let day: Vec<f64> = check_ins
                    .iter()
                    .filter(|c| c.timestamp.date_naive() == date)
                    .map(|c| c.sss as f64)
                    .collect();
                if day.is_empty() {
                    0.0
                } else {
                    let avg = day.iter().sum::<f64>() / day.len() as f64;
                    (avg * 10.0).round() / 10.0
                }
            })
            .collect();

        let tst_7d = week
            .dates()
            .map(|date| {
                sleep_entries
                    .iter()
                    .find(|entry| entry.date == date)
                    .and_then(total_sleep_minutes)
                    .unwrap_or(0)
            })
            .collect();

        let today_arm = experiments
            .iter()
            .find(|exp| ExperimentStatus::of(exp, today) == ExperimentStatus::Active)
            .and_then(|exp| {
                assignments
                    .iter()
                    .find(|a| Some(a.experiment_id) == exp.id && a.date == today)
                    .map(|a| TodayArm {
                        arm: a.arm,
                        experiment: exp.clone(),
                    })
            });

        Self {
            last_night_tst,
            today_nap_minutes,
            latest_sss,
            avg_sss_7d,
            tst_7d,
            today_arm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{block_schedule, BlockDuration};
    use crate::types::{CheckInContext, ExperimentDesign, ExperimentMetric};
    use chrono::{NaiveTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_store_snapshot() {
        let snapshot =
            DashboardSnapshot::build(date(2024, 1, 15), &[], &[], &[], &[], &[]);
        assert_eq!(snapshot.last_night_tst, None);
        assert_eq!(snapshot.today_nap_minutes, 0);
        assert_eq!(snapshot.latest_sss, None);
        assert_eq!(snapshot.avg_sss_7d, vec![0.0; 7]);
        assert_eq!(snapshot.tst_7d, vec![0; 7]);
        assert!(snapshot.today_arm.is_none());
    }

    #[test]
    fn test_series_alignment_and_rounding() {
        let today = date(2024, 1, 15);
        let check = |d: u32, h: u32, sss: u8| CheckIn {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap(),
            context: CheckInContext::Other,
            sss,
            notes: None,
            selected_data_points: Vec::new(),
        };
        // Two check-ins on the 14th average 3.5; one on the 15th is 6
        let check_ins = vec![check(14, 9, 3), check(14, 15, 4), check(15, 9, 6)];

        let entry = SleepEntry {
            id: None,
            date: date(2024, 1, 14),
            bedtime: None,
            sleep_onset: Some(time(23, 0)),
            wake_time: Some(time(7, 0)),
            quality: 4,
            notes: None,
        };

        let snapshot =
            DashboardSnapshot::build(today, &[entry], &[], &check_ins, &[], &[]);

        // Window is 01-09..01-15: the 14th is index 5, the 15th index 6
        assert_eq!(snapshot.avg_sss_7d[5], 3.5);
        assert_eq!(snapshot.avg_sss_7d[6], 6.0);
        assert_eq!(snapshot.tst_7d[5], 480);
        assert_eq!(snapshot.tst_7d[6], 0);
        assert_eq!(snapshot.last_night_tst, Some(480));
        assert_eq!(snapshot.latest_sss, Some(6));
    }

    #[test]
    fn test_today_nap_total_sums_and_ignores_other_days() {
        let today = date(2024, 1, 15);
        let nap = |d: u32, start: (u32, u32), end: (u32, u32)| Nap {
            id: None,
            date: date(2024, 1, d),
            start: time(start.0, start.1),
            end: time(end.0, end.1),
            planned: true,
            refreshing: 3,
            notes: None,
        };
        let naps = vec![
            nap(15, (13, 0), (13, 30)),
            nap(15, (17, 0), (17, 20)),
            nap(14, (13, 0), (14, 0)),
        ];

        let snapshot = DashboardSnapshot::build(today, &[], &naps, &[], &[], &[]);
        assert_eq!(snapshot.today_nap_minutes, 50);
    }

    #[test]
    fn test_today_arm_of_active_experiment() {
        let today = date(2024, 1, 5);
        let experiment = Experiment {
            id: Some(Uuid::new_v4()),
            title: "Nap timing".to_string(),
            goal: None,
            metric: ExperimentMetric::MiddaySssAvg,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 7),
            design: ExperimentDesign::Block,
            arm_a_desc: "Nap at 13:00".to_string(),
            arm_b_desc: "Nap at 15:00".to_string(),
        };
        let assignments: Vec<ArmAssignment> =
            block_schedule(date(2024, 1, 1), BlockDuration::Seven)
                .into_iter()
                .map(|(d, arm)| ArmAssignment {
                    id: Some(Uuid::new_v4()),
                    experiment_id: experiment.id.unwrap(),
                    date: d,
                    arm,
                })
                .collect();

        let snapshot = DashboardSnapshot::build(
            today,
            &[],
            &[],
            &[],
            &[experiment.clone()],
            &assignments,
        );

        // Day 5 of a 7-day block is the first arm B day
        let today_arm = snapshot.today_arm.expect("experiment is active today");
        assert_eq!(today_arm.arm, Arm::B);
        assert_eq!(today_arm.experiment.title, experiment.title);
    }

    #[test]
    fn test_completed_experiment_has_no_today_arm() {
        let experiment = Experiment {
            id: Some(Uuid::new_v4()),
            title: "Done".to_string(),
            goal: None,
            metric: ExperimentMetric::MiddaySssAvg,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 7),
            design: ExperimentDesign::Block,
            arm_a_desc: "A".to_string(),
            arm_b_desc: "B".to_string(),
        };
        let snapshot = DashboardSnapshot::build(
            date(2024, 2, 1),
            &[],
            &[],
            &[],
            &[experiment],
            &[],
        );
        assert!(snapshot.today_arm.is_none());
    }
}
