//! Somno CLI - command-line interface for Somnolog
//!
//! Commands:
//! - log: record a sleep entry, nap, check-in, or medication intake
//! - med: manage tracked medications
//! - datapoint: manage custom data point labels
//! - experiment: create and list Block A/B experiments
//! - dashboard: today / recent snapshot
//! - graph: per-day aggregate rows for one record kind
//! - summary: plain-text range summary
//! - export: CSV, JSON, and calendar reminder documents
//! - settings: show and edit per-user settings
//!
//! State lives in a JSON store file (`--store`), loaded at startup and
//! written back after a successful mutation.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use uuid::Uuid;

use somnolog::aggregate::{
    daily_check_ins, daily_med_intakes, daily_naps, daily_sleep, DateRange, RangePreset,
};
use somnolog::dashboard::DashboardSnapshot;
use somnolog::experiment::{
    create_block_experiment, BlockDuration, ExperimentDraft, ExperimentStatus,
};
use somnolog::export::{bedtime_reminder_ics, records_to_csv, FullExport};
use somnolog::metrics::{auto_detect_context, format_minutes_hm, logical_sleep_date};
use somnolog::store::{MemoryStore, RecordStore};
use somnolog::summary::range_summary;
use somnolog::types::{
    CheckIn, CheckInContext, CustomDataPoint, ExperimentMetric, MedIntake, Medication,
    Nap, SleepEntry,
};
use somnolog::{TrackerError, SOMNOLOG_VERSION};

/// Stanford Sleepiness Scale descriptions, indexed by score - 1
const SSS_LABELS: [&str; 7] = [
    "Feeling active, vital, alert, wide awake",
    "Functioning at high levels, but not at peak",
    "Awake, but relaxed; responsive but not fully alert",
    "Somewhat foggy, let down",
    "Foggy; losing interest; slowed down",
    "Sleepy, woozy, fighting sleep; prefer to lie down",
    "No longer fighting sleep, soon start to dream",
];

/// Somno - personal sleep and alertness tracker
#[derive(Parser)]
#[command(name = "somno")]
#[command(version = SOMNOLOG_VERSION)]
#[command(about = "Log sleep, naps, check-ins, and meds; run A/B self-experiments", long_about = None)]
struct Cli {
    /// Path to the JSON store file
    #[arg(long, default_value = "somnolog.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a sleep entry, nap, check-in, or medication intake
    Log {
        #[command(subcommand)]
        record: LogRecord,
    },

    /// Manage tracked medications
    Med {
        #[command(subcommand)]
        action: MedAction,
    },

    /// Manage custom data point labels
    Datapoint {
        #[command(subcommand)]
        action: DatapointAction,
    },

    /// Create and list Block A/B experiments
    Experiment {
        #[command(subcommand)]
        action: ExperimentAction,
    },

    /// Today / recent snapshot
    Dashboard,

    /// Plain-text summary over a date range (defaults to the last 7 days)
    Summary {
        #[arg(long, conflicts_with = "range")]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        /// Named lookback window instead of an explicit start date
        #[arg(long, value_enum)]
        range: Option<RangeArg>,
    },

    /// Per-day aggregate rows for one record kind
    Graph {
        #[arg(value_enum)]
        entity: GraphEntity,

        /// Named lookback window
        #[arg(long, value_enum, default_value = "7d")]
        range: RangeArg,

        /// Last day of the window; defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Export data as CSV, JSON, or a calendar reminder
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },

    /// Show or edit settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum LogRecord {
    /// Log last night's sleep
    Sleep {
        /// Logical sleep date; defaults to yesterday before noon, today after
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time you went to bed (HH:MM)
        #[arg(long)]
        bedtime: Option<String>,

        /// Time you fell asleep (HH:MM)
        #[arg(long)]
        onset: Option<String>,

        /// Time you woke up (HH:MM)
        #[arg(long)]
        wake: Option<String>,

        /// Sleep quality, 1-5
        #[arg(long)]
        quality: u8,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log a nap
    Nap {
        /// Nap date; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Start time (HH:MM)
        #[arg(long)]
        start: String,

        /// End time (HH:MM)
        #[arg(long)]
        end: String,

        /// The nap was planned rather than involuntary
        #[arg(long)]
        planned: bool,

        /// How refreshing it felt, 1-5
        #[arg(long)]
        refreshing: u8,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log a Stanford Sleepiness Scale check-in
    Checkin {
        /// SSS score, 1-7; prompts interactively when omitted on a TTY
        #[arg(long)]
        sss: Option<u8>,

        /// Context; detected from the current hour when omitted
        #[arg(long)]
        context: Option<ContextArg>,

        #[arg(long)]
        notes: Option<String>,

        /// Custom data point labels to tag this check-in with (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Log a medication intake
    Med {
        /// Medication name, as created with `somno med add`
        #[arg(long)]
        name: String,

        /// Dose override in mg; defaults to the medication's dose
        #[arg(long)]
        dose_mg: Option<f64>,
    },
}

#[derive(Subcommand)]
enum MedAction {
    /// Define a medication to track intakes against
    Add {
        #[arg(long)]
        name: String,

        /// Default dose in mg
        #[arg(long)]
        dose_mg: Option<f64>,

        /// Taken as needed rather than on a schedule
        #[arg(long)]
        as_needed: bool,

        /// Scheduled intake times (HH:MM, repeatable)
        #[arg(long = "schedule")]
        schedule_times: Vec<String>,
    },
    /// List tracked medications
    List,
}

#[derive(Subcommand)]
enum DatapointAction {
    /// Add a custom data point label
    Add { name: String },
    /// List custom data point labels
    List,
    /// Remove a custom data point label by name
    Remove { name: String },
}

#[derive(Subcommand)]
enum ExperimentAction {
    /// Create a Block A/B experiment and its full arm schedule
    New {
        #[arg(long)]
        title: String,

        #[arg(long)]
        goal: Option<String>,

        #[arg(long, value_enum)]
        metric: MetricArg,

        /// Block length in days
        #[arg(long, value_enum, default_value = "7")]
        duration: DurationArg,

        /// First day of the experiment; defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Arm A description, e.g. "Bedtime at 22:30 sharp"
        #[arg(long)]
        arm_a: String,

        /// Arm B description, e.g. "Flexible bedtime"
        #[arg(long)]
        arm_b: String,
    },
    /// List experiments with their status
    List,
}

#[derive(Subcommand)]
enum ExportFormat {
    /// One entity collection as CSV
    Csv {
        #[arg(value_enum)]
        entity: EntityArg,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// Every collection as one JSON document
    Json {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// The bedtime reminder as an .ics calendar document
    Ics {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Update one or more settings
    Set {
        /// IANA timezone name, e.g. "America/New_York"
        #[arg(long)]
        timezone: Option<String>,

        /// Bedtime reminder time (HH:MM)
        #[arg(long)]
        reminder_time: Option<String>,

        /// Enable or disable the bedtime reminder
        #[arg(long)]
        reminder_enabled: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContextArg {
    Morning,
    Midday,
    Evening,
    Other,
}

impl From<ContextArg> for CheckInContext {
    fn from(arg: ContextArg) -> Self {
        match arg {
            ContextArg::Morning => CheckInContext::Morning,
            ContextArg::Midday => CheckInContext::Midday,
            ContextArg::Evening => CheckInContext::Evening,
            ContextArg::Other => CheckInContext::Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Mean SSS among Midday check-ins
    MiddaySss,
    /// Mean 1-5 sleep quality
    SleepQuality,
    /// Mean total sleep time in minutes
    Tst,
}

impl From<MetricArg> for ExperimentMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::MiddaySss => ExperimentMetric::MiddaySssAvg,
            MetricArg::SleepQuality => ExperimentMetric::SleepQualityAvg,
            MetricArg::Tst => ExperimentMetric::TotalSleepMinutes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DurationArg {
    /// 7 days: 4 on arm A, 3 on arm B
    #[value(name = "7")]
    Seven,
    /// 14 days: 7 on arm A, 7 on arm B
    #[value(name = "14")]
    Fourteen,
}

impl From<DurationArg> for BlockDuration {
    fn from(arg: DurationArg) -> Self {
        match arg {
            DurationArg::Seven => BlockDuration::Seven,
            DurationArg::Fourteen => BlockDuration::Fourteen,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RangeArg {
    #[value(name = "1d")]
    OneDay,
    #[value(name = "2d")]
    TwoDays,
    #[value(name = "3d")]
    ThreeDays,
    #[value(name = "7d")]
    SevenDays,
    #[value(name = "30d")]
    ThirtyDays,
    #[value(name = "6m")]
    SixMonths,
    #[value(name = "1y")]
    OneYear,
    All,
}

impl From<RangeArg> for RangePreset {
    fn from(arg: RangeArg) -> Self {
        match arg {
            RangeArg::OneDay => RangePreset::OneDay,
            RangeArg::TwoDays => RangePreset::TwoDays,
            RangeArg::ThreeDays => RangePreset::ThreeDays,
            RangeArg::SevenDays => RangePreset::SevenDays,
            RangeArg::ThirtyDays => RangePreset::ThirtyDays,
            RangeArg::SixMonths => RangePreset::SixMonths,
            RangeArg::OneYear => RangePreset::OneYear,
            RangeArg::All => RangePreset::All,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityArg {
    Sleep,
    Naps,
    Checkins,
    Meds,
    Intakes,
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphEntity {
    Checkins,
    Sleep,
    Naps,
    Meds,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Tracker(#[from] TrackerError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Usage(String),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut store = load_store(&cli.store)?;

    let mutated = match cli.command {
        Commands::Log { record } => cmd_log(&mut store, record)?,
        Commands::Med { action } => cmd_med(&mut store, action)?,
        Commands::Datapoint { action } => cmd_datapoint(&mut store, action)?,
        Commands::Experiment { action } => cmd_experiment(&mut store, action)?,
        Commands::Dashboard => {
            cmd_dashboard(&store);
            false
        }
        Commands::Summary { start, end, range } => {
            cmd_summary(&store, start, end, range);
            false
        }
        Commands::Graph { entity, range, end } => {
            cmd_graph(&store, entity, range, end);
            false
        }
        Commands::Export { format } => {
            cmd_export(&store, format)?;
            false
        }
        Commands::Settings { action } => cmd_settings(&mut store, action)?,
    };

    if mutated {
        save_store(&cli.store, &store)?;
    }
    Ok(())
}

fn load_store(path: &Path) -> Result<MemoryStore, CliError> {
    if path.exists() {
        let json = fs::read_to_string(path)?;
        Ok(MemoryStore::from_json(&json).map_err(TrackerError::from)?)
    } else {
        // First run: a fresh store for a new local profile
        Ok(MemoryStore::open(Uuid::new_v4()))
    }
}

fn save_store(path: &Path, store: &MemoryStore) -> Result<(), CliError> {
    let json = store.to_json().map_err(TrackerError::from)?;
    fs::write(path, json)?;
    Ok(())
}

fn parse_hhmm(input: &str) -> Result<NaiveTime, CliError> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| CliError::Tracker(TrackerError::InvalidTimeFormat(input.to_string())))
}

fn parse_opt_hhmm(input: Option<&str>) -> Result<Option<NaiveTime>, CliError> {
    input.map(parse_hhmm).transpose()
}

fn cmd_log(store: &mut MemoryStore, record: LogRecord) -> Result<bool, CliError> {
    match record {
        LogRecord::Sleep {
            date,
            bedtime,
            onset,
            wake,
            quality,
            notes,
        } => {
            let date =
                date.unwrap_or_else(|| logical_sleep_date(Local::now().naive_local()));
            let entry = store.insert_sleep_entry(SleepEntry {
                id: None,
                date,
                bedtime: parse_opt_hhmm(bedtime.as_deref())?,
                sleep_onset: parse_opt_hhmm(onset.as_deref())?,
                wake_time: parse_opt_hhmm(wake.as_deref())?,
                quality,
                notes,
            })?;
            println!(
                "Logged sleep for {}: TST {}",
                entry.date,
                format_minutes_hm(somnolog::metrics::total_sleep_minutes(&entry)),
            );
        }

        LogRecord::Nap {
            date,
            start,
            end,
            planned,
            refreshing,
            notes,
        } => {
            let nap = store.insert_nap(Nap {
                id: None,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
                start: parse_hhmm(&start)?,
                end: parse_hhmm(&end)?,
                planned,
                refreshing,
                notes,
            })?;
            println!(
                "Logged nap on {}: {}",
                nap.date,
                format_minutes_hm(Some(somnolog::metrics::nap_duration(&nap))),
            );
        }

        LogRecord::Checkin {
            sss,
            context,
            notes,
            tags,
        } => {
            let sss = match sss {
                Some(sss) => sss,
                None => prompt_sss()?,
            };
            let context = context.map(CheckInContext::from).unwrap_or_else(|| {
                auto_detect_context(Local::now().hour())
            });
            let check_in = store.insert_check_in(CheckIn {
                id: None,
                timestamp: chrono::Utc::now(),
                context,
                sss,
                notes,
                selected_data_points: tags,
            })?;
            println!(
                "Check-in saved: SSS {} ({})",
                check_in.sss,
                check_in.context.as_str()
            );
        }

        LogRecord::Med { name, dose_mg } => {
            let medication = store
                .medications()
                .into_iter()
                .find(|m| m.name.eq_ignore_ascii_case(&name))
                .ok_or_else(|| {
                    CliError::Usage(format!(
                        "unknown medication '{name}'; create it with `somno med add`"
                    ))
                })?;
            let medication_id = medication
                .id
                .ok_or_else(|| CliError::Usage("medication has no id".to_string()))?;
            let intake = store.insert_med_intake(MedIntake {
                id: None,
                medication_id,
                timestamp: chrono::Utc::now(),
                dose_mg: dose_mg.or(medication.dose_mg),
                taken: true,
            })?;
            match intake.dose_mg {
                Some(dose) => println!("Logged {} ({} mg)", medication.name, dose),
                None => println!("Logged {}", medication.name),
            }
        }
    }
    Ok(true)
}

/// Interactive SSS prompt, shown when --sss is omitted on a TTY
fn prompt_sss() -> Result<u8, CliError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::Usage(
            "--sss is required when stdin is not a terminal".to_string(),
        ));
    }

    println!("Stanford Sleepiness Scale:");
    for (index, label) in SSS_LABELS.iter().enumerate() {
        println!("  {}. {label}", index + 1);
    }
    print!("SSS (1-7): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    line.trim()
        .parse::<u8>()
        .ok()
        .filter(|sss| (1..=7).contains(sss))
        .ok_or_else(|| CliError::Usage("expected a score between 1 and 7".to_string()))
}

fn cmd_med(store: &mut MemoryStore, action: MedAction) -> Result<bool, CliError> {
    match action {
        MedAction::Add {
            name,
            dose_mg,
            as_needed,
            schedule_times,
        } => {
            let schedule_times = if schedule_times.is_empty() {
                None
            } else {
                Some(
                    schedule_times
                        .iter()
                        .map(|t| parse_hhmm(t))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            };
            let medication = store.insert_medication(Medication {
                id: None,
                name,
                dose_mg,
                schedule_times,
                as_needed,
            })?;
            println!("Added medication {}", medication.name);
            Ok(true)
        }
        MedAction::List => {
            for medication in store.medications() {
                let dose = medication
                    .dose_mg
                    .map(|d| format!(" {d} mg"))
                    .unwrap_or_default();
                let tag = if medication.as_needed {
                    " (as needed)"
                } else {
                    ""
                };
                println!("{}{dose}{tag}", medication.name);
            }
            Ok(false)
        }
    }
}

fn cmd_datapoint(store: &mut MemoryStore, action: DatapointAction) -> Result<bool, CliError> {
    match action {
        DatapointAction::Add { name } => {
            let point = store.insert_custom_data_point(CustomDataPoint { id: None, name })?;
            println!("Added data point {}", point.name);
            Ok(true)
        }
        DatapointAction::List => {
            for point in store.custom_data_points() {
                println!("{}", point.name);
            }
            Ok(false)
        }
        DatapointAction::Remove { name } => {
            let point = store
                .custom_data_points()
                .into_iter()
                .find(|p| p.name == name)
                .ok_or_else(|| CliError::Usage(format!("no data point named '{name}'")))?;
            let id = point
                .id
                .ok_or_else(|| CliError::Usage("data point has no id".to_string()))?;
            store.delete_custom_data_point(id)?;
            println!("Removed data point {name}");
            Ok(true)
        }
    }
}

fn cmd_experiment(store: &mut MemoryStore, action: ExperimentAction) -> Result<bool, CliError> {
    match action {
        ExperimentAction::New {
            title,
            goal,
            metric,
            duration,
            start,
            arm_a,
            arm_b,
        } => {
            let duration = BlockDuration::from(duration);
            let experiment = create_block_experiment(
                store,
                ExperimentDraft {
                    title,
                    goal,
                    metric: metric.into(),
                    start_date: start.unwrap_or_else(|| Local::now().date_naive()),
                    arm_a_desc: arm_a,
                    arm_b_desc: arm_b,
                },
                duration,
            )?;
            println!(
                "Created experiment '{}' ({} days, {} \u{2192} {})",
                experiment.title,
                duration.days(),
                experiment.start_date,
                experiment.end_date,
            );
            Ok(true)
        }
        ExperimentAction::List => {
            let today = Local::now().date_naive();
            for experiment in store.experiments() {
                let status = ExperimentStatus::of(&experiment, today);
                println!(
                    "[{}] {} ({}, {} \u{2192} {})",
                    status.as_str(),
                    experiment.title,
                    experiment.metric.as_str(),
                    experiment.start_date,
                    experiment.end_date,
                );
                println!("  Arm A: {}", experiment.arm_a_desc);
                println!("  Arm B: {}", experiment.arm_b_desc);
            }
            Ok(false)
        }
    }
}

fn cmd_dashboard(store: &MemoryStore) {
    let today = Local::now().date_naive();
    let snapshot = DashboardSnapshot::build(
        today,
        &store.sleep_entries(),
        &store.naps(),
        &store.check_ins(),
        &store.experiments(),
        &store.arm_assignments(),
    );

    println!("Somnolog \u{2014} {today}");
    println!("Last night TST: {}", format_minutes_hm(snapshot.last_night_tst));
    println!(
        "Today's naps:   {}",
        format_minutes_hm(Some(snapshot.today_nap_minutes))
    );
    match snapshot.latest_sss {
        Some(sss) => println!("Latest SSS:     {sss}"),
        None => println!("Latest SSS:     \u{2014}"),
    }

    let sss_series: Vec<String> = snapshot
        .avg_sss_7d
        .iter()
        .map(|v| if *v > 0.0 { format!("{v:.1}") } else { "\u{2014}".to_string() })
        .collect();
    println!("Avg SSS (7d):   {}", sss_series.join(" "));

    let tst_series: Vec<String> = snapshot
        .tst_7d
        .iter()
        .map(|v| if *v > 0 { format!("{}", v / 60) } else { "\u{2014}".to_string() })
        .collect();
    println!("TST hours (7d): {}", tst_series.join(" "));

    if let Some(today_arm) = snapshot.today_arm {
        let desc = match today_arm.arm {
            somnolog::types::Arm::A => &today_arm.experiment.arm_a_desc,
            somnolog::types::Arm::B => &today_arm.experiment.arm_b_desc,
        };
        println!(
            "Active experiment: {} \u{2014} today is arm {}: {desc}",
            today_arm.experiment.title,
            today_arm.arm.as_str(),
        );
    }
}

fn cmd_summary(
    store: &MemoryStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    preset: Option<RangeArg>,
) {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let range = match (start, preset) {
        (Some(start), _) => DateRange::new(start, end),
        (None, Some(preset)) => RangePreset::from(preset).resolve(end),
        (None, None) => DateRange::trailing_days(end, 7),
    };

    let text = range_summary(
        &range,
        &store.sleep_entries(),
        &store.naps(),
        &store.check_ins(),
        &store.experiments(),
        &store.arm_assignments(),
    );
    println!("{text}");
}

fn cmd_graph(
    store: &MemoryStore,
    entity: GraphEntity,
    range: RangeArg,
    end: Option<NaiveDate>,
) {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let range = RangePreset::from(range).resolve(end);

    match entity {
        GraphEntity::Checkins => {
            let tracked: Vec<String> = store
                .custom_data_points()
                .into_iter()
                .map(|p| p.name)
                .collect();
            for row in daily_check_ins(&range, &store.check_ins(), &tracked) {
                let tags: Vec<String> = row
                    .data_point_counts
                    .iter()
                    .filter(|(_, count)| **count > 0)
                    .map(|(label, count)| format!("{label}:{count}"))
                    .collect();
                println!("{}  avg SSS {:.1}  {}", row.date, row.avg_sss, tags.join(" "));
            }
        }
        GraphEntity::Sleep => {
            for row in daily_sleep(&range, &store.sleep_entries()) {
                println!(
                    "{}  TST {}  quality {}",
                    row.date,
                    format_minutes_hm(row.total_sleep_minutes),
                    row.quality,
                );
            }
        }
        GraphEntity::Naps => {
            for row in daily_naps(&range, &store.naps()) {
                println!(
                    "{}  {}  refreshing {}",
                    row.date,
                    format_minutes_hm(Some(row.duration_minutes)),
                    row.refreshing,
                );
            }
        }
        GraphEntity::Meds => {
            let medications = store.medications();
            let selected: Vec<Uuid> =
                medications.iter().filter_map(|m| m.id).collect();
            for row in daily_med_intakes(&range, &store.med_intakes(), &selected) {
                let counts: Vec<String> = medications
                    .iter()
                    .filter_map(|m| {
                        let count = m.id.and_then(|id| row.counts.get(&id))?;
                        (*count > 0).then(|| format!("{}:{}", m.name, count))
                    })
                    .collect();
                println!("{}  {}", row.date, counts.join(" "));
            }
        }
    }
}

fn cmd_export(store: &MemoryStore, format: ExportFormat) -> Result<(), CliError> {
    let (document, output) = match format {
        ExportFormat::Csv { entity, output } => {
            let csv = match entity {
                EntityArg::Sleep => records_to_csv(&store.sleep_entries()),
                EntityArg::Naps => records_to_csv(&store.naps()),
                EntityArg::Checkins => records_to_csv(&store.check_ins()),
                EntityArg::Meds => records_to_csv(&store.medications()),
                EntityArg::Intakes => records_to_csv(&store.med_intakes()),
            }?;
            if csv.is_empty() {
                return Err(CliError::Usage("no data to export".to_string()));
            }
            (csv, output)
        }
        ExportFormat::Json { output } => {
            (FullExport::from_store(store).to_json_pretty()?, output)
        }
        ExportFormat::Ics { output } => {
            let settings = store.settings();
            (bedtime_reminder_ics(settings.bedtime_reminder_time), output)
        }
    };

    if output.to_string_lossy() == "-" {
        println!("{document}");
    } else {
        fs::write(&output, document)?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn cmd_settings(store: &mut MemoryStore, action: SettingsAction) -> Result<bool, CliError> {
    match action {
        SettingsAction::Show => {
            let settings = store.settings();
            println!("Timezone:         {}", settings.timezone);
            println!(
                "Bedtime reminder: {} ({})",
                settings.bedtime_reminder_time.format("%H:%M"),
                if settings.bedtime_reminder_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            Ok(false)
        }
        SettingsAction::Set {
            timezone,
            reminder_time,
            reminder_enabled,
        } => {
            let mut settings = store.settings();
            if let Some(timezone) = timezone {
                settings.timezone = timezone;
            }
            if let Some(reminder_time) = reminder_time {
                settings.bedtime_reminder_time = parse_hhmm(&reminder_time)?;
            }
            if let Some(enabled) = reminder_enabled {
                settings.bedtime_reminder_enabled = enabled;
            }
            store.put_settings(settings)?;
            println!("Settings saved");
            Ok(true)
        }
    }
}
