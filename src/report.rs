//! Period reports
//!
//! Mean/min/max summaries over a date-bounded window for the fixed report
//! metrics, plus the printable text block the report page is built from.
//! An empty qualifying set is reported as "no data", never computed.

use crate::catalog::MetricId;
use crate::query::{keyword_matches, QueryWindow};
use crate::types::{Entry, Reading};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Metrics summarized in period reports.
pub const REPORT_METRICS: [MetricId; 3] = [MetricId::Hr, MetricId::Temp, MetricId::Sugar];

/// Mean/min/max over the qualifying numeric values of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Compute summary statistics for one metric over the window.
///
/// Only entries with a parseable timestamp inside the window, a matching
/// memo (when a keyword is given) and a present numeric value count.
/// `None` is the explicit no-data outcome.
pub fn summary_stats(
    entries: &[Entry],
    window: &QueryWindow,
    keyword: Option<&str>,
    metric: MetricId,
) -> Option<SummaryStats> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for entry in entries {
        let Some(ts) = entry.timestamp() else { continue };
        if !window.contains(ts) || !keyword_matches(entry, keyword) {
            continue;
        }
        if let Reading::Value(value) = entry.numeric(metric) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
    }

    if count == 0 {
        return None;
    }
    Some(SummaryStats {
        mean: sum / count as f64,
        min,
        max,
        count,
    })
}

/// Printable period summary over whole days.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stats: Vec<(MetricId, Option<SummaryStats>)>,
}

impl PeriodReport {
    /// Summarize the report metrics between two dates, both included.
    pub fn build(entries: &[Entry], start: NaiveDate, end: NaiveDate) -> PeriodReport {
        let window = QueryWindow::from_dates(start, end);
        let stats = REPORT_METRICS
            .iter()
            .map(|&metric| (metric, summary_stats(entries, &window, None, metric)))
            .collect();
        PeriodReport { start, end, stats }
    }

    /// Summarize the trailing `days`-day period ending on `end`.
    pub fn last_days(entries: &[Entry], end: NaiveDate, days: i64) -> PeriodReport {
        PeriodReport::build(entries, end - Duration::days(days.max(1) - 1), end)
    }

    /// Text block for the report cover: title, period, one line per metric.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "바디로그 리포트".to_string(),
            format!("기간: {} ~ {}", self.start, self.end),
            String::new(),
        ];
        for (metric, stats) in &self.stats {
            let label = metric.meta().label;
            match stats {
                Some(s) => lines.push(format!(
                    "- {}: 평균 {:.1}, 최솟값 {:.1}, 최댓값 {:.1}",
                    label, s.mean, s.min, s.max
                )),
                None => lines.push(format!("- {}: 데이터 없음", label)),
            }
        }
        lines
    }
}
