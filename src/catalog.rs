//! Metric catalog
//!
//! Static registry of the trackable metrics: identifier, human label, value
//! kind, unit and input hints, plus the plottable series derived from them.
//! Blood pressure is stored as one composite field but plots as two
//! pseudo-metrics (systolic, diastolic).

use serde::{Deserialize, Serialize};

/// Identifier of a trackable metric, as stored on disk.
///
/// Declaration order is the display order used for table projection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricId {
    /// Blood pressure, combined "systolic/diastolic" text (mmHg)
    Bp,
    /// Heart rate (bpm)
    Hr,
    /// Body temperature (°C)
    Temp,
    /// Blood sugar (mg/dL)
    Sugar,
    /// Oxygen saturation (%)
    Spo2,
    /// Respiration rate (/min)
    Rr,
    /// Body weight (kg)
    Weight,
    /// Waist circumference (cm)
    Waist,
    /// Body-mass index (kg/m²), derived from weight and profile height
    Bmi,
}

/// Value shape a metric field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Composite text, e.g. "120/80"
    Text,
    Int,
    Float,
}

/// Static description of one catalog metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricMeta {
    /// Human label shown in tables and reports
    pub label: &'static str,
    pub kind: ValueKind,
    pub unit: &'static str,
    /// Input step hint for decimal metrics
    pub step: Option<f64>,
    /// Input placeholder hint
    pub placeholder: Option<&'static str>,
}

impl MetricId {
    /// Every catalog metric, in display order.
    pub const ALL: [MetricId; 9] = [
        MetricId::Bp,
        MetricId::Hr,
        MetricId::Temp,
        MetricId::Sugar,
        MetricId::Spo2,
        MetricId::Rr,
        MetricId::Weight,
        MetricId::Waist,
        MetricId::Bmi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::Bp => "bp",
            MetricId::Hr => "hr",
            MetricId::Temp => "temp",
            MetricId::Sugar => "sugar",
            MetricId::Spo2 => "spo2",
            MetricId::Rr => "rr",
            MetricId::Weight => "weight",
            MetricId::Waist => "waist",
            MetricId::Bmi => "bmi",
        }
    }

    /// Look up a metric by its on-disk key.
    pub fn from_key(key: &str) -> Option<MetricId> {
        MetricId::ALL.iter().copied().find(|m| m.as_str() == key)
    }

    /// Static metadata for this metric.
    pub fn meta(&self) -> MetricMeta {
        match self {
            MetricId::Bp => MetricMeta {
                label: "혈압(수축/이완)",
                kind: ValueKind::Text,
                unit: "mmHg",
                step: None,
                placeholder: Some("120/80"),
            },
            MetricId::Hr => MetricMeta {
                label: "심박수(bpm)",
                kind: ValueKind::Int,
                unit: "bpm",
                step: None,
                placeholder: None,
            },
            MetricId::Temp => MetricMeta {
                label: "체온(°C)",
                kind: ValueKind::Float,
                unit: "°C",
                step: Some(0.1),
                placeholder: None,
            },
            MetricId::Sugar => MetricMeta {
                label: "혈당(mg/dL)",
                kind: ValueKind::Float,
                unit: "mg/dL",
                step: Some(0.1),
                placeholder: None,
            },
            MetricId::Spo2 => MetricMeta {
                label: "SpO₂(%)",
                kind: ValueKind::Int,
                unit: "%",
                step: None,
                placeholder: None,
            },
            MetricId::Rr => MetricMeta {
                label: "호흡수(RR)",
                kind: ValueKind::Int,
                unit: "/min",
                step: None,
                placeholder: None,
            },
            MetricId::Weight => MetricMeta {
                label: "체중(kg)",
                kind: ValueKind::Float,
                unit: "kg",
                step: Some(0.1),
                placeholder: None,
            },
            MetricId::Waist => MetricMeta {
                label: "허리둘레(cm)",
                kind: ValueKind::Float,
                unit: "cm",
                step: Some(0.1),
                placeholder: None,
            },
            MetricId::Bmi => MetricMeta {
                label: "BMI(kg/m²)",
                kind: ValueKind::Float,
                unit: "kg/m²",
                step: Some(0.1),
                placeholder: None,
            },
        }
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plottable series selector.
///
/// Scalar metrics map one to one; blood pressure fans out into the systolic
/// and diastolic pseudo-metrics. Waist circumference is tracked but not
/// plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMetric {
    BpSys,
    BpDia,
    Hr,
    Temp,
    Sugar,
    Spo2,
    Rr,
    Weight,
    Bmi,
}

impl PlotMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotMetric::BpSys => "bp_sys",
            PlotMetric::BpDia => "bp_dia",
            PlotMetric::Hr => "hr",
            PlotMetric::Temp => "temp",
            PlotMetric::Sugar => "sugar",
            PlotMetric::Spo2 => "spo2",
            PlotMetric::Rr => "rr",
            PlotMetric::Weight => "weight",
            PlotMetric::Bmi => "bmi",
        }
    }

    pub fn from_key(key: &str) -> Option<PlotMetric> {
        const ALL: [PlotMetric; 9] = [
            PlotMetric::BpSys,
            PlotMetric::BpDia,
            PlotMetric::Hr,
            PlotMetric::Temp,
            PlotMetric::Sugar,
            PlotMetric::Spo2,
            PlotMetric::Rr,
            PlotMetric::Weight,
            PlotMetric::Bmi,
        ];
        ALL.iter().copied().find(|m| m.as_str() == key)
    }

    /// The stored metric this series reads from.
    pub fn source(&self) -> MetricId {
        match self {
            PlotMetric::BpSys | PlotMetric::BpDia => MetricId::Bp,
            PlotMetric::Hr => MetricId::Hr,
            PlotMetric::Temp => MetricId::Temp,
            PlotMetric::Sugar => MetricId::Sugar,
            PlotMetric::Spo2 => MetricId::Spo2,
            PlotMetric::Rr => MetricId::Rr,
            PlotMetric::Weight => MetricId::Weight,
            PlotMetric::Bmi => MetricId::Bmi,
        }
    }

    /// Plot title
    pub fn title(&self) -> &'static str {
        match self {
            PlotMetric::BpSys => "수축기(mmHg)",
            PlotMetric::BpDia => "이완기(mmHg)",
            PlotMetric::Hr => "심박수(bpm)",
            PlotMetric::Temp => "체온(°C)",
            PlotMetric::Sugar => "혈당(mg/dL)",
            PlotMetric::Spo2 => "SpO₂(%)",
            PlotMetric::Rr => "호흡수(/min)",
            PlotMetric::Weight => "체중(kg)",
            PlotMetric::Bmi => "BMI(kg/m²)",
        }
    }

    /// Y-axis unit
    pub fn unit(&self) -> &'static str {
        match self {
            PlotMetric::BpSys | PlotMetric::BpDia => "mmHg",
            PlotMetric::Hr => "bpm",
            PlotMetric::Temp => "°C",
            PlotMetric::Sugar => "mg/dL",
            PlotMetric::Spo2 => "%",
            PlotMetric::Rr => "/min",
            PlotMetric::Weight => "kg",
            PlotMetric::Bmi => "kg/m²",
        }
    }
}

impl std::fmt::Display for PlotMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expand the active metrics into their plottable series.
///
/// Blood pressure contributes both pseudo-metrics, waist contributes
/// nothing; first-occurrence order is kept and duplicates dropped.
pub fn plot_options(active_metrics: &[MetricId]) -> Vec<PlotMetric> {
    let mut options = Vec::new();
    for metric in active_metrics {
        let expanded: &[PlotMetric] = match metric {
            MetricId::Bp => &[PlotMetric::BpSys, PlotMetric::BpDia],
            MetricId::Hr => &[PlotMetric::Hr],
            MetricId::Temp => &[PlotMetric::Temp],
            MetricId::Sugar => &[PlotMetric::Sugar],
            MetricId::Spo2 => &[PlotMetric::Spo2],
            MetricId::Rr => &[PlotMetric::Rr],
            MetricId::Weight => &[PlotMetric::Weight],
            MetricId::Waist => &[],
            MetricId::Bmi => &[PlotMetric::Bmi],
        };
        for option in expanded {
            if !options.contains(option) {
                options.push(*option);
            }
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_round_trip() {
        for metric in MetricId::ALL {
            assert_eq!(MetricId::from_key(metric.as_str()), Some(metric));
        }
        assert_eq!(MetricId::from_key("steps"), None);
    }

    #[test]
    fn test_serde_keys_match_as_str() {
        for metric in MetricId::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));
        }
    }

    #[test]
    fn test_plot_options_expands_bp() {
        let options = plot_options(&[MetricId::Bp, MetricId::Hr]);
        assert_eq!(
            options,
            vec![PlotMetric::BpSys, PlotMetric::BpDia, PlotMetric::Hr]
        );
    }

    #[test]
    fn test_plot_options_skips_waist_and_dedupes() {
        let options = plot_options(&[
            MetricId::Waist,
            MetricId::Hr,
            MetricId::Hr,
            MetricId::Bmi,
        ]);
        assert_eq!(options, vec![PlotMetric::Hr, PlotMetric::Bmi]);
    }

    #[test]
    fn test_plot_source() {
        assert_eq!(PlotMetric::BpSys.source(), MetricId::Bp);
        assert_eq!(PlotMetric::BpDia.source(), MetricId::Bp);
        assert_eq!(PlotMetric::Sugar.source(), MetricId::Sugar);
    }

    #[test]
    fn test_meta_kinds() {
        assert_eq!(MetricId::Bp.meta().kind, ValueKind::Text);
        assert_eq!(MetricId::Hr.meta().kind, ValueKind::Int);
        assert_eq!(MetricId::Weight.meta().kind, ValueKind::Float);
        assert_eq!(MetricId::Bp.meta().placeholder, Some("120/80"));
    }
}
