//! Plain-text range summary
//!
//! Builds the copy-pasteable snapshot the weekly summary view shows: sleep
//! averages, SSS breakdown by context, nap totals, and, when an experiment
//! overlaps the range, the arm comparison with its observation line.

use crate::aggregate::DateRange;
use crate::experiment::compare_arms;
use crate::metrics::{nap_duration, total_sleep_minutes};
use crate::types::{
    ArmAssignment, CheckIn, CheckInContext, Experiment, Nap, SleepEntry,
};

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn hours_minutes(minutes: f64) -> String {
    format!("{}h {}m", (minutes / 60.0).floor() as i64, (minutes % 60.0).round() as i64)
}

/// Generate the snapshot text for an inclusive date range.
///
/// The first experiment whose window overlaps the range contributes the
/// comparison block; others are ignored, matching the single-experiment
/// reading of the summary view.
pub fn range_summary(
    range: &DateRange,
    sleep_entries: &[SleepEntry],
    naps: &[Nap],
    check_ins: &[CheckIn],
    experiments: &[Experiment],
    assignments: &[ArmAssignment],
) -> String {
    let sleep_in_range: Vec<&SleepEntry> = sleep_entries
        .iter()
        .filter(|s| range.contains(s.date))
        .collect();

    let tst_values: Vec<f64> = sleep_in_range
        .iter()
        .filter_map(|s| total_sleep_minutes(s))
        .map(|m| m as f64)
        .collect();
    let avg_tst = mean(&tst_values);
    let quality_values: Vec<f64> =
        sleep_in_range.iter().map(|s| s.quality as f64).collect();
    let avg_quality = mean(&quality_values);

    let check_ins_in_range: Vec<&CheckIn> = check_ins
        .iter()
        .filter(|c| range.contains(c.timestamp.date_naive()))
        .collect();

    let sss_for = |context: Option<CheckInContext>| -> f64 {
        let values: Vec<f64> = check_ins_in_range
            .iter()
            .filter(|c| context.map_or(true, |ctx| c.context == ctx))
            .map(|c| c.sss as f64)
            .collect();
        mean(&values)
    };

    let avg_sss = sss_for(None);
    let avg_morning = sss_for(Some(CheckInContext::Morning));
    let avg_midday = sss_for(Some(CheckInContext::Midday));
    let avg_evening = sss_for(Some(CheckInContext::Evening));

    let naps_in_range: Vec<&Nap> =
        naps.iter().filter(|n| range.contains(n.date)).collect();
    let total_nap_minutes: f64 = naps_in_range
        .iter()
        .map(|n| nap_duration(n) as f64)
        .sum();

    let mut summary = format!(
        "WEEKLY SLEEP SNAPSHOT ({} \u{2192} {})\n\n\
         Sleep: Avg TST: {}; Avg quality: {:.1}/5\n\n\
         SSS: Overall {:.1}; Morning {:.1}, Midday {:.1}, Evening {:.1}\n\n\
         Naps: {} naps; total {}",
        range.start,
        range.end,
        hours_minutes(avg_tst),
        avg_quality,
        avg_sss,
        avg_morning,
        avg_midday,
        avg_evening,
        naps_in_range.len(),
        hours_minutes(total_nap_minutes),
    );

    let overlapping = experiments
        .iter()
        .find(|exp| !(exp.end_date < range.start || exp.start_date > range.end));
    if let Some(experiment) = overlapping {
        let comparison = compare_arms(
            experiment,
            assignments,
            range,
            check_ins,
            sleep_entries,
        );

        summary.push_str(&format!(
            "\n\nExperiment: {} vs {}\n\
             - Arm A: {} {:.1}\n\
             - Arm B: {} {:.1}",
            experiment.arm_a_desc,
            experiment.arm_b_desc,
            experiment.metric.as_str(),
            comparison.arm_a,
            experiment.metric.as_str(),
            comparison.arm_b,
        ));

        if let Some(observation) = comparison.observation {
            summary.push_str(&format!(
                "\nObservation: Arm {} showed better results (difference: {:.1})",
                observation.favored.as_str(),
                observation.difference,
            ));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{block_schedule, BlockDuration};
    use crate::types::{ExperimentDesign, ExperimentMetric};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn night(d: u32, onset: (u32, u32), wake: (u32, u32), quality: u8) -> SleepEntry {
        SleepEntry {
            id: None,
            date: date(2024, 1, d),
            bedtime: None,
            sleep_onset: NaiveTime::from_hms_opt(onset.0, onset.1, 0),
            wake_time: NaiveTime::from_hms_opt(wake.0, wake.1, 0),
            quality,
            notes: None,
        }
    }

    fn check(d: u32, hour: u32, context: CheckInContext, sss: u8) -> CheckIn {
        CheckIn {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, d, hour, 0, 0).unwrap(),
            context,
            sss,
            notes: None,
            selected_data_points: Vec::new(),
        }
    }

    #[test]
    fn test_summary_without_experiment() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7));
        let sleep = vec![
            night(1, (23, 0), (7, 0), 4),  // 480 min
            night(2, (23, 30), (7, 15), 3), // 465 min
        ];
        let naps = vec![Nap {
            id: None,
            date: date(2024, 1, 2),
            start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(13, 40, 0).unwrap(),
            planned: true,
            refreshing: 4,
            notes: None,
        }];
        let check_ins = vec![
            check(1, 9, CheckInContext::Morning, 2),
            check(1, 13, CheckInContext::Midday, 4),
            check(2, 20, CheckInContext::Evening, 6),
        ];

        let text = range_summary(&range, &sleep, &naps, &check_ins, &[], &[]);

        assert!(text.starts_with("WEEKLY SLEEP SNAPSHOT (2024-01-01 \u{2192} 2024-01-07)"));
        // (480 + 465) / 2 = 472.5 -> 7h 53m (floor hours, round minutes)
        assert!(text.contains("Avg TST: 7h 53m"), "got: {text}");
        assert!(text.contains("Avg quality: 3.5/5"));
        assert!(text.contains("SSS: Overall 4.0; Morning 2.0, Midday 4.0, Evening 6.0"));
        assert!(text.contains("Naps: 1 naps; total 0h 40m"));
        assert!(!text.contains("Experiment:"));
    }

    #[test]
    fn test_summary_with_overlapping_experiment() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7));
        let experiment = Experiment {
            id: Some(Uuid::new_v4()),
            title: "Earlier bedtime".to_string(),
            goal: None,
            metric: ExperimentMetric::TotalSleepMinutes,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 7),
            design: ExperimentDesign::Block,
            arm_a_desc: "Bed at 22:00".to_string(),
            arm_b_desc: "Bed whenever".to_string(),
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

        // Arm A: 420, 450; arm B: 480, 500 -> diff 55 favors B
        let sleep = vec![
            night(1, (0, 0), (7, 0), 3),
            night(2, (0, 0), (7, 30), 3),
            night(5, (0, 0), (8, 0), 3),
            night(6, (0, 0), (8, 20), 3),
        ];

        let text = range_summary(&range, &sleep, &[], &[], &[experiment], &assignments);

        assert!(text.contains("Experiment: Bed at 22:00 vs Bed whenever"));
        assert!(text.contains("- Arm A: TST (min) 435.0"));
        assert!(text.contains("- Arm B: TST (min) 490.0"));
        assert!(text.contains(
            "Observation: Arm B showed better results (difference: 55.0)"
        ));
    }

    #[test]
    fn test_summary_empty_range_is_zeroed_not_error() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7));
        let text = range_summary(&range, &[], &[], &[], &[], &[]);
        assert!(text.contains("Avg TST: 0h 0m"));
        assert!(text.contains("Naps: 0 naps"));
    }
}
