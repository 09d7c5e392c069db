//! Time-window queries
//!
//! Filters the entry collection over an inclusive start/end range with an
//! optional memo keyword, and projects the result three ways: table rows
//! for display, numeric series for plotting, and per-metric threshold
//! bands for chart shading. Entries whose timestamp fails to parse are
//! excluded from every view here but stay in the collection.

use crate::catalog::{MetricId, PlotMetric};
use crate::config::Thresholds;
use crate::evaluate::{abnormal_flags, flag_line};
use crate::types::Entry;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Inclusive timestamp range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl QueryWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> QueryWindow {
        QueryWindow { start, end }
    }

    /// Whole days: `start` 00:00:00 through `end` 23:59:59.999999.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> QueryWindow {
        QueryWindow {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(day_end()),
        }
    }

    /// The trailing `days`-day window ending on `end`, both days included.
    pub fn last_days(end: NaiveDate, days: i64) -> QueryWindow {
        QueryWindow::from_dates(end - Duration::days(days.max(1) - 1), end)
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}

fn day_end() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).expect("valid time of day")
}

/// Whether the entry's memo matches an optional keyword filter.
///
/// Case-sensitive substring match; an entry without a memo never matches a
/// non-empty keyword, and an empty or missing keyword matches everything.
pub(crate) fn keyword_matches(entry: &Entry, keyword: Option<&str>) -> bool {
    match keyword {
        Some(kw) if !kw.is_empty() => {
            entry.memo.as_deref().map_or(false, |memo| memo.contains(kw))
        }
        _ => true,
    }
}

/// One display row for a qualifying entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Display timestamp, `YYYY-MM-DD HH:MM`
    pub when: String,
    /// (label, value) pairs for every present metric, catalog order
    pub values: Vec<(String, String)>,
    /// Joined abnormality labels; empty when none
    pub flags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Project the qualifying entries as display rows.
pub fn table_rows(
    entries: &[Entry],
    window: &QueryWindow,
    keyword: Option<&str>,
    thresholds: &Thresholds,
) -> Vec<TableRow> {
    entries
        .iter()
        .filter_map(|entry| {
            let ts = entry.timestamp()?;
            if !window.contains(ts) || !keyword_matches(entry, keyword) {
                return None;
            }
            let values = entry
                .metrics()
                .map(|(id, value)| (id.meta().label.to_string(), value.display()))
                .collect();
            Some(TableRow {
                when: ts.format("%Y-%m-%d %H:%M").to_string(),
                values,
                flags: flag_line(&abnormal_flags(entry, thresholds)),
                memo: entry.memo.clone(),
            })
        })
        .collect()
}

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub ts: NaiveDateTime,
    pub value: f64,
}

/// Extract the numeric series for one plot metric.
///
/// The blood-pressure pseudo-metrics go through the composite parser and
/// emit their component only when both components parse; malformed or
/// absent values are dropped silently.
pub fn series(
    entries: &[Entry],
    window: &QueryWindow,
    keyword: Option<&str>,
    metric: PlotMetric,
) -> Vec<SeriesPoint> {
    entries
        .iter()
        .filter_map(|entry| {
            let ts = entry.timestamp()?;
            if !window.contains(ts) || !keyword_matches(entry, keyword) {
                return None;
            }
            let value = match metric {
                PlotMetric::BpSys => entry
                    .composite(MetricId::Bp)
                    .value()
                    .map(|(sys, _)| sys as f64),
                PlotMetric::BpDia => entry
                    .composite(MetricId::Bp)
                    .value()
                    .map(|(_, dia)| dia as f64),
                other => entry.numeric(other.source()).value(),
            }?;
            Some(SeriesPoint { ts, value })
        })
        .collect()
}

/// Series plus the presentation pair the chart layer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: PlotMetric,
    pub title: String,
    pub unit: String,
    pub points: Vec<SeriesPoint>,
}

/// Build the full chart payload for one plot metric.
pub fn chart_series(
    entries: &[Entry],
    window: &QueryWindow,
    keyword: Option<&str>,
    metric: PlotMetric,
) -> ChartSeries {
    ChartSeries {
        metric,
        title: metric.title().to_string(),
        unit: metric.unit().to_string(),
        points: series(entries, window, keyword, metric),
    }
}

/// A shaded abnormal region on a chart.
///
/// `None` bounds extend to the edge of the plotted range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdBand {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ThresholdBand {
    fn above(limit: f64) -> ThresholdBand {
        ThresholdBand { lower: Some(limit), upper: None }
    }

    fn below(limit: f64) -> ThresholdBand {
        ThresholdBand { lower: None, upper: Some(limit) }
    }

    fn between(lower: f64, upper: f64) -> ThresholdBand {
        ThresholdBand { lower: Some(lower), upper: Some(upper) }
    }
}

/// Abnormal regions to shade behind one plot metric.
pub fn threshold_bands(metric: PlotMetric, thr: &Thresholds) -> Vec<ThresholdBand> {
    match metric {
        PlotMetric::Hr => vec![
            ThresholdBand::above(thr.hr_hi),
            ThresholdBand::below(thr.hr_lo),
        ],
        PlotMetric::Temp => vec![ThresholdBand::above(thr.temp_hi)],
        PlotMetric::Sugar => vec![
            ThresholdBand::above(thr.sugar_very),
            ThresholdBand::between(thr.sugar_hi, thr.sugar_very),
            ThresholdBand::below(thr.sugar_lo),
        ],
        PlotMetric::Spo2 => vec![ThresholdBand::below(thr.spo2_lo)],
        PlotMetric::Rr => vec![
            ThresholdBand::above(thr.rr_hi),
            ThresholdBand::below(thr.rr_lo),
        ],
        PlotMetric::BpSys => vec![
            ThresholdBand::above(thr.bp_sys_very),
            ThresholdBand::between(thr.bp_sys_hi, thr.bp_sys_very),
        ],
        PlotMetric::BpDia => vec![
            ThresholdBand::above(thr.bp_dia_very),
            ThresholdBand::between(thr.bp_dia_hi, thr.bp_dia_very),
        ],
        PlotMetric::Weight | PlotMetric::Bmi => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricValue;
    use pretty_assertions::assert_eq;

    fn entry(ts: &str, fields: &[(MetricId, MetricValue)], memo: Option<&str>) -> Entry {
        let mut e = Entry::new(ts);
        for (id, value) in fields {
            e.set(*id, value.clone());
        }
        e.memo = memo.map(str::to_string);
        e
    }

    fn sample_entries() -> Vec<Entry> {
        vec![
            entry(
                "2024-01-20T08:00:00",
                &[
                    (MetricId::Bp, MetricValue::Text("150/95".to_string())),
                    (MetricId::Hr, MetricValue::Int(72)),
                ],
                Some("아침 약 복용"),
            ),
            entry(
                "2024-01-18T21:00:00",
                &[(MetricId::Hr, MetricValue::Int(130))],
                None,
            ),
            entry(
                "2024-01-10T08:00:00",
                &[(MetricId::Hr, MetricValue::Int(80))],
                Some("기간 밖"),
            ),
            entry(
                "corrupt-ts",
                &[(MetricId::Hr, MetricValue::Int(999))],
                None,
            ),
        ]
    }

    fn window() -> QueryWindow {
        QueryWindow::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 21).unwrap(),
        )
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let w = window();
        assert!(w.contains("2024-01-15T00:00:00".parse().unwrap()));
        assert!(w.contains("2024-01-21T23:59:59".parse().unwrap()));
        assert!(!w.contains("2024-01-14T23:59:59".parse().unwrap()));
        assert!(!w.contains("2024-01-22T00:00:00".parse().unwrap()));
    }

    #[test]
    fn test_last_days_window() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
        let w = QueryWindow::last_days(end, 7);
        assert_eq!(w.start.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(w.end.date(), end);
    }

    #[test]
    fn test_table_rows_filter_and_project() {
        let entries = sample_entries();
        let thr = Thresholds::default();
        let rows = table_rows(&entries, &window(), None, &thr);

        // The out-of-range entry and the corrupt timestamp are excluded.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].when, "2024-01-20 08:00");
        assert_eq!(
            rows[0].values,
            vec![
                ("혈압(수축/이완)".to_string(), "150/95".to_string()),
                ("심박수(bpm)".to_string(), "72".to_string()),
            ]
        );
        assert_eq!(rows[0].flags, "혈압 높음");
        assert_eq!(rows[0].memo.as_deref(), Some("아침 약 복용"));

        assert_eq!(rows[1].flags, "심박 비정상");
        assert_eq!(rows[1].memo, None);
    }

    #[test]
    fn test_keyword_is_case_sensitive_substring() {
        let entries = sample_entries();
        let thr = Thresholds::default();

        let rows = table_rows(&entries, &window(), Some("아침"), &thr);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].when, "2024-01-20 08:00");

        // Entries without a memo never match a non-empty keyword.
        assert!(table_rows(&entries, &window(), Some("저녁"), &thr).is_empty());

        // An empty keyword is no filter at all.
        let rows = table_rows(&entries, &window(), Some(""), &thr);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_series_splits_bp_components() {
        let entries = sample_entries();
        let sys = series(&entries, &window(), None, PlotMetric::BpSys);
        assert_eq!(sys.len(), 1);
        assert_eq!(sys[0].value, 150.0);

        let dia = series(&entries, &window(), None, PlotMetric::BpDia);
        assert_eq!(dia[0].value, 95.0);
    }

    #[test]
    fn test_series_drops_malformed_values() {
        let entries = vec![
            entry(
                "2024-01-19T08:00:00",
                &[(MetricId::Bp, MetricValue::Text("bad".to_string()))],
                None,
            ),
            entry(
                "2024-01-20T08:00:00",
                &[(MetricId::Hr, MetricValue::Text("fast".to_string()))],
                None,
            ),
        ];
        assert!(series(&entries, &window(), None, PlotMetric::BpSys).is_empty());
        assert!(series(&entries, &window(), None, PlotMetric::Hr).is_empty());
    }

    #[test]
    fn test_query_is_idempotent() {
        let entries = sample_entries();
        let thr = Thresholds::default();
        let w = window();

        assert_eq!(
            table_rows(&entries, &w, Some("아침"), &thr),
            table_rows(&entries, &w, Some("아침"), &thr)
        );
        assert_eq!(
            series(&entries, &w, None, PlotMetric::Hr),
            series(&entries, &w, None, PlotMetric::Hr)
        );
    }

    #[test]
    fn test_chart_series_carries_title_and_unit() {
        let entries = sample_entries();
        let chart = chart_series(&entries, &window(), None, PlotMetric::BpSys);
        assert_eq!(chart.title, "수축기(mmHg)");
        assert_eq!(chart.unit, "mmHg");
        assert_eq!(chart.points.len(), 1);
    }

    #[test]
    fn test_threshold_bands() {
        let thr = Thresholds::default();
        assert_eq!(
            threshold_bands(PlotMetric::Sugar, &thr),
            vec![
                ThresholdBand { lower: Some(240.0), upper: None },
                ThresholdBand { lower: Some(180.0), upper: Some(240.0) },
                ThresholdBand { lower: None, upper: Some(60.0) },
            ]
        );
        assert!(threshold_bands(PlotMetric::Weight, &thr).is_empty());
        assert_eq!(
            threshold_bands(PlotMetric::Spo2, &thr),
            vec![ThresholdBand { lower: None, upper: Some(92.0) }]
        );
    }
}
