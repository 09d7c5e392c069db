//! Bodylog CLI - record, query and maintain a personal health log
//!
//! Commands:
//! - add: record one observation (warnings printed on threshold crossings)
//! - list: table view over a date window, optional memo keyword
//! - series: numeric series for one plot metric
//! - report: period summary for the trailing days
//! - delete: remove entries by id, by date range, or all
//! - import: append entries from newline-delimited JSON on stdin
//! - migrate: assign ids to legacy entries
//! - config / profile: show or update thresholds, metrics and height

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Duration, Local, NaiveDate, NaiveTime};

use bodylog::{
    abnormal_flags, chart_series, derive_bmi, flag_line, table_rows, AppConfig, Entry,
    EntryStore, JsonFileStorage, MetricId, MetricValue, PeriodReport, PlotMetric,
    Profile, QueryWindow, Thresholds, ValueKind, BODYLOG_VERSION,
};

/// Bodylog - personal health log with threshold warnings
#[derive(Parser)]
#[command(name = "bodylog")]
#[command(version = BODYLOG_VERSION)]
#[command(about = "Record vitals, flag threshold crossings, query the log", long_about = None)]
struct Cli {
    /// Entry collection file
    #[arg(long, default_value = "bodylog.json", global = true)]
    data: PathBuf,

    /// Config file (active metrics and thresholds)
    #[arg(long, default_value = "bodylog_config.json", global = true)]
    config: PathBuf,

    /// Profile file (height used for BMI derivation)
    #[arg(long, default_value = "bodylog_profile.json", global = true)]
    profile: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one observation
    Add {
        /// Observation date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Observation time (HH:MM or HHMM, default now)
        #[arg(long)]
        time: Option<String>,

        /// Metric value, repeatable: --set hr=72 --set bp=120/80
        #[arg(long = "set", value_name = "METRIC=VALUE")]
        set: Vec<String>,

        /// Free-text memo
        #[arg(long)]
        memo: Option<String>,
    },

    /// Show table rows over a date window
    List {
        /// Trailing window in days (ignored when --start is given)
        #[arg(long, default_value = "14")]
        days: i64,

        /// Window start date
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Window end date (default today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Memo keyword filter (case-sensitive substring)
        #[arg(long)]
        keyword: Option<String>,

        /// Output rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the numeric series for one plot metric
    Series {
        /// Plot metric (bp_sys, bp_dia, hr, temp, sugar, spo2, rr, weight, bmi)
        #[arg(long)]
        metric: String,

        /// Trailing window in days (ignored when --start is given)
        #[arg(long, default_value = "14")]
        days: i64,

        /// Window start date
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Window end date (default today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        format: SeriesFormat,
    },

    /// Print the period summary for the trailing days
    Report {
        /// Report span in days
        #[arg(long, default_value = "7")]
        days: i64,
    },

    /// Delete entries by id, by date range, or all
    Delete {
        /// Entry ids to delete
        #[arg(long, num_args = 1..)]
        ids: Vec<String>,

        /// Range start date (default 7 days ago)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Range end date (default today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Delete every entry
        #[arg(long)]
        all: bool,

        /// Confirm range or full deletion
        #[arg(long)]
        yes: bool,
    },

    /// Append entries from newline-delimited JSON on stdin
    Import,

    /// Assign ids to legacy entries lacking one
    Migrate,

    /// Show or update the config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show or update the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current config
    Show,

    /// Update one threshold limit
    SetThreshold { name: String, value: f64 },

    /// Replace the active metric list (comma-separated ids)
    SetMetrics { metrics: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the current profile
    Show,

    /// Set the height in centimeters (0 clears it)
    SetHeight { height_cm: f64 },
}

#[derive(Clone, ValueEnum)]
enum SeriesFormat {
    /// One JSON point per line
    Ndjson,
    /// Comma-separated ts,value rows
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BodylogCliError> {
    match cli.command {
        Commands::Add { date, time, set, memo } => {
            cmd_add(&cli.data, &cli.config, &cli.profile, date, time, set, memo)
        }
        Commands::List { days, start, end, keyword, json } => {
            cmd_list(&cli.data, &cli.config, days, start, end, keyword.as_deref(), json)
        }
        Commands::Series { metric, days, start, end, format } => {
            cmd_series(&cli.data, &metric, days, start, end, format)
        }
        Commands::Report { days } => cmd_report(&cli.data, days),
        Commands::Delete { ids, start, end, all, yes } => {
            cmd_delete(&cli.data, ids, start, end, all, yes)
        }
        Commands::Import => cmd_import(&cli.data),
        Commands::Migrate => cmd_migrate(&cli.data),
        Commands::Config { action } => cmd_config(&cli.config, action),
        Commands::Profile { action } => cmd_profile(&cli.profile, action),
    }
}

fn cmd_add(
    data: &Path,
    config_path: &Path,
    profile_path: &Path,
    date: Option<NaiveDate>,
    time: Option<String>,
    set: Vec<String>,
    memo: Option<String>,
) -> Result<(), BodylogCliError> {
    let config = load_config(config_path);
    let profile = load_profile(profile_path);

    let now = Local::now().naive_local();
    let date = date.unwrap_or_else(|| now.date());
    let time = match time {
        Some(text) => parse_time(&text).ok_or_else(|| {
            BodylogCliError::BadArgument(format!(
                "invalid time '{text}', expected HH:MM or HHMM"
            ))
        })?,
        None => now.time(),
    };

    let mut entry = Entry::at(date.and_time(time));
    for assignment in &set {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            BodylogCliError::BadArgument(format!("expected METRIC=VALUE, got '{assignment}'"))
        })?;
        let metric = MetricId::from_key(key).ok_or_else(|| {
            BodylogCliError::BadArgument(format!("unknown metric '{key}'"))
        })?;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = match metric.meta().kind {
            ValueKind::Int => MetricValue::Int(raw.parse().map_err(|_| {
                BodylogCliError::BadArgument(format!("{key} expects an integer, got '{raw}'"))
            })?),
            ValueKind::Float => MetricValue::Float(raw.parse().map_err(|_| {
                BodylogCliError::BadArgument(format!("{key} expects a number, got '{raw}'"))
            })?),
            ValueKind::Text => MetricValue::Text(raw.to_string()),
        };
        entry.set(metric, value);
    }
    if let Some(memo) = memo {
        let memo = memo.trim();
        if !memo.is_empty() {
            entry.memo = Some(memo.to_string());
        }
    }

    derive_bmi(&mut entry, &profile, &config.metrics);

    let flags = abnormal_flags(&entry, &config.thresholds);
    let mut store = EntryStore::open(JsonFileStorage::new(data))?;
    let id = store.append(entry)?;

    println!("saved {id}");
    if !flags.is_empty() {
        eprintln!("경고: {}", flag_line(&flags));
    }
    Ok(())
}

fn cmd_list(
    data: &Path,
    config_path: &Path,
    days: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    keyword: Option<&str>,
    json: bool,
) -> Result<(), BodylogCliError> {
    let config = load_config(config_path);
    let store = EntryStore::open(JsonFileStorage::new(data))?;
    let window = window_from_args(days, start, end);
    let rows = table_rows(store.entries(), &window, keyword, &config.thresholds);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("조회 기간에 해당하는 기록이 없습니다");
        return Ok(());
    }
    for row in &rows {
        let values = row
            .values
            .iter()
            .map(|(label, value)| format!("{label}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut line = format!("{}  {}", row.when, values);
        if !row.flags.is_empty() {
            line.push_str(&format!("  [{}]", row.flags));
        }
        if let Some(memo) = &row.memo {
            line.push_str(&format!("  ({memo})"));
        }
        println!("{line}");
    }
    Ok(())
}

fn cmd_series(
    data: &Path,
    metric: &str,
    days: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    format: SeriesFormat,
) -> Result<(), BodylogCliError> {
    let metric = PlotMetric::from_key(metric).ok_or_else(|| {
        BodylogCliError::BadArgument(format!("unknown plot metric '{metric}'"))
    })?;
    let store = EntryStore::open(JsonFileStorage::new(data))?;
    let window = window_from_args(days, start, end);
    let chart = chart_series(store.entries(), &window, None, metric);

    match format {
        SeriesFormat::Ndjson => {
            for point in &chart.points {
                println!("{}", serde_json::to_string(point)?);
            }
        }
        SeriesFormat::Csv => {
            println!("ts,value");
            for point in &chart.points {
                println!("{},{}", point.ts.format("%Y-%m-%dT%H:%M:%S"), point.value);
            }
        }
    }
    Ok(())
}

fn cmd_report(data: &Path, days: i64) -> Result<(), BodylogCliError> {
    let store = EntryStore::open(JsonFileStorage::new(data))?;
    let today = Local::now().date_naive();
    let report = PeriodReport::last_days(store.entries(), today, days);
    for line in report.render_lines() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_delete(
    data: &Path,
    ids: Vec<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    all: bool,
    yes: bool,
) -> Result<(), BodylogCliError> {
    let mut store = EntryStore::open(JsonFileStorage::new(data))?;

    if all {
        if !yes {
            return Err(BodylogCliError::NeedsConfirmation(store.len()));
        }
        let removed = store.delete_all()?;
        println!("{removed}건 삭제 완료");
        return Ok(());
    }

    if !ids.is_empty() {
        let ids: HashSet<String> = ids.into_iter().collect();
        let removed = store.delete_by_ids(&ids)?;
        println!("{removed}건 삭제 완료");
        return Ok(());
    }

    if start.is_some() || end.is_some() {
        let today = Local::now().date_naive();
        let window = QueryWindow::from_dates(
            start.unwrap_or(today - Duration::days(7)),
            end.unwrap_or(today),
        );
        let candidates = store
            .entries()
            .iter()
            .filter(|e| e.timestamp().is_some_and(|ts| window.contains(ts)))
            .count();
        if !yes {
            println!("삭제 대상 미리보기: {candidates}건");
            return Err(BodylogCliError::NeedsConfirmation(candidates));
        }
        let removed = store.delete_by_range(&window)?;
        println!("{removed}건 삭제 완료");
        return Ok(());
    }

    Err(BodylogCliError::BadArgument(
        "pass --ids, --start/--end, or --all".to_string(),
    ))
}

fn cmd_import(data: &Path) -> Result<(), BodylogCliError> {
    if atty::is(atty::Stream::Stdin) {
        return Err(BodylogCliError::BadArgument(
            "import reads newline-delimited JSON from stdin; pipe a file in".to_string(),
        ));
    }

    let mut store = EntryStore::open(JsonFileStorage::new(data))?;
    let stdin = io::stdin();
    let mut imported = 0usize;
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry: Entry = serde_json::from_str(trimmed)?;
        store.append(entry)?;
        imported += 1;
    }
    println!("imported {imported} entries");
    Ok(())
}

fn cmd_migrate(data: &Path) -> Result<(), BodylogCliError> {
    let mut store = EntryStore::open(JsonFileStorage::new(data))?;
    let migrated = store.backfill_ids()?;
    println!("기존 기록 {migrated}건에 ID 부여 완료");
    Ok(())
}

fn cmd_config(config_path: &Path, action: ConfigAction) -> Result<(), BodylogCliError> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path);
            println!("{}", config.to_json()?);
        }
        ConfigAction::SetThreshold { name, value } => {
            let mut config = load_config(config_path);
            if !config.thresholds.set(&name, value) {
                return Err(BodylogCliError::BadArgument(format!(
                    "unknown threshold '{}', known keys: {}",
                    name,
                    Thresholds::KEYS.join(", ")
                )));
            }
            fs::write(config_path, config.to_json()?)?;
            println!("{name} = {value}");
        }
        ConfigAction::SetMetrics { metrics } => {
            let mut parsed = Vec::new();
            for key in metrics.split(',') {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                let metric = MetricId::from_key(key).ok_or_else(|| {
                    BodylogCliError::BadArgument(format!("unknown metric '{key}'"))
                })?;
                if !parsed.contains(&metric) {
                    parsed.push(metric);
                }
            }
            let mut config = load_config(config_path);
            config.metrics = parsed;
            fs::write(config_path, config.to_json()?)?;
            println!(
                "metrics = {}",
                config
                    .metrics
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_profile(profile_path: &Path, action: ProfileAction) -> Result<(), BodylogCliError> {
    match action {
        ProfileAction::Show => {
            let profile = load_profile(profile_path);
            println!("{}", profile.to_json()?);
        }
        ProfileAction::SetHeight { height_cm } => {
            let mut profile = load_profile(profile_path);
            profile.height_cm = if height_cm > 0.0 { Some(height_cm) } else { None };
            fs::write(profile_path, profile.to_json()?)?;
            match profile.height_cm {
                Some(h) => println!("height_cm = {h}"),
                None => println!("height cleared"),
            }
        }
    }
    Ok(())
}

// Helper functions

/// Fail-open config load: a missing or malformed file yields defaults.
fn load_config(path: &Path) -> AppConfig {
    fs::read_to_string(path)
        .map(|text| AppConfig::from_json(&text))
        .unwrap_or_default()
}

/// Fail-open profile load: a missing or malformed file yields the empty profile.
fn load_profile(path: &Path) -> Profile {
    fs::read_to_string(path)
        .map(|text| Profile::from_json(&text))
        .unwrap_or_default()
}

/// Accept "09:30" or "0930".
fn parse_time(text: &str) -> Option<NaiveTime> {
    let t = text.trim();
    if t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()) {
        return NaiveTime::parse_from_str(t, "%H%M").ok();
    }
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

/// Explicit dates win over the trailing-days window.
fn window_from_args(days: i64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> QueryWindow {
    let today = Local::now().date_naive();
    match (start, end) {
        (Some(s), e) => QueryWindow::from_dates(s, e.unwrap_or(today)),
        (None, Some(e)) => QueryWindow::last_days(e, days),
        (None, None) => QueryWindow::last_days(today, days),
    }
}

// Error types

enum BodylogCliError {
    Io(io::Error),
    Store(bodylog::LogError),
    Json(serde_json::Error),
    BadArgument(String),
    NeedsConfirmation(usize),
}

impl From<io::Error> for BodylogCliError {
    fn from(e: io::Error) -> Self {
        BodylogCliError::Io(e)
    }
}

impl From<bodylog::LogError> for BodylogCliError {
    fn from(e: bodylog::LogError) -> Self {
        BodylogCliError::Store(e)
    }
}

impl From<serde_json::Error> for BodylogCliError {
    fn from(e: serde_json::Error) -> Self {
        BodylogCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BodylogCliError> for CliError {
    fn from(e: BodylogCliError) -> Self {
        match e {
            BodylogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BodylogCliError::Store(e) => CliError {
                code: "STORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the data file path and permissions".to_string()),
            },
            BodylogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BodylogCliError::BadArgument(message) => CliError {
                code: "BAD_ARGUMENT".to_string(),
                message,
                hint: Some("Run with --help for usage".to_string()),
            },
            BodylogCliError::NeedsConfirmation(count) => CliError {
                code: "CONFIRM_REQUIRED".to_string(),
                message: format!("{count} entries would be deleted"),
                hint: Some("Re-run with --yes to confirm".to_string()),
            },
        }
    }
}
