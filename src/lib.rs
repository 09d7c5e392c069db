//! Bodylog - threshold evaluation and time-window aggregation for personal
//! health logs
//!
//! Bodylog keeps a single collection of timestamped vital-sign observations,
//! classifies each observation against a mutable set of numeric thresholds,
//! derives body-mass index from the stored profile, and answers date-ranged
//! queries with table rows, plot series and period summaries.
//!
//! ## Modules
//!
//! - **catalog / types**: the metric registry and the typed observation model
//! - **composite / evaluate / derive**: field parsing, abnormality flags, BMI
//! - **store**: append/delete over the persisted collection
//! - **query / report**: time-window filtering, series and period summaries

pub mod catalog;
pub mod composite;
pub mod config;
pub mod derive;
pub mod error;
pub mod evaluate;
pub mod query;
pub mod report;
pub mod store;
pub mod types;

pub use catalog::{plot_options, MetricId, MetricMeta, PlotMetric, ValueKind};
pub use composite::parse_composite;
pub use config::{AppConfig, Profile, Thresholds};
pub use derive::derive_bmi;
pub use error::LogError;
pub use evaluate::{abnormal_flags, flag_line, Flag};
pub use query::{
    chart_series, series, table_rows, threshold_bands, ChartSeries, QueryWindow,
    SeriesPoint, TableRow, ThresholdBand,
};
pub use report::{summary_stats, PeriodReport, SummaryStats, REPORT_METRICS};
pub use store::{EntryStore, JsonFileStorage, LogStorage, MemoryStorage};
pub use types::{parse_timestamp, Entry, EntryLog, MetricValue, Reading};

/// Library version embedded in the CLI.
pub const BODYLOG_VERSION: &str = env!("CARGO_PKG_VERSION");
