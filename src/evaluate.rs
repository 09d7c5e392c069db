//! Abnormality evaluation
//!
//! Classifies one observation against the current thresholds into an
//! ordered list of flags. Pure and total: absent and malformed fields are
//! skipped, nothing errors. For blood pressure and sugar the critical
//! variant wins over the plain "high" variant; the two never co-occur for
//! the same field.

use crate::catalog::MetricId;
use crate::config::Thresholds;
use crate::types::{Entry, Reading};
use serde::{Deserialize, Serialize};

/// One abnormality classification, in fixed rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    BpVeryHigh,
    BpHigh,
    HrAbnormal,
    Fever,
    SugarDanger,
    SugarHigh,
    LowOxygen,
    RrAbnormal,
}

impl Flag {
    /// Warning label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Flag::BpVeryHigh => "혈압 매우 높음",
            Flag::BpHigh => "혈압 높음",
            Flag::HrAbnormal => "심박 비정상",
            Flag::Fever => "고열",
            Flag::SugarDanger => "혈당 위험",
            Flag::SugarHigh => "혈당 높음",
            Flag::LowOxygen => "저산소",
            Flag::RrAbnormal => "호흡수 이상",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluate one observation against the given thresholds.
///
/// Each rule contributes at most one flag; flags appear in rule-declaration
/// order so output is deterministic.
pub fn abnormal_flags(entry: &Entry, thr: &Thresholds) -> Vec<Flag> {
    let mut flags = Vec::new();

    if let Reading::Value((sys, dia)) = entry.composite(MetricId::Bp) {
        let (sys, dia) = (sys as f64, dia as f64);
        if sys >= thr.bp_sys_very || dia >= thr.bp_dia_very {
            flags.push(Flag::BpVeryHigh);
        } else if sys >= thr.bp_sys_hi || dia >= thr.bp_dia_hi {
            flags.push(Flag::BpHigh);
        }
    }

    if let Reading::Value(hr) = entry.numeric(MetricId::Hr) {
        if hr < thr.hr_lo || hr > thr.hr_hi {
            flags.push(Flag::HrAbnormal);
        }
    }

    if let Reading::Value(temp) = entry.numeric(MetricId::Temp) {
        if temp >= thr.temp_hi {
            flags.push(Flag::Fever);
        }
    }

    if let Reading::Value(sugar) = entry.numeric(MetricId::Sugar) {
        if sugar >= thr.sugar_very || sugar <= thr.sugar_lo {
            flags.push(Flag::SugarDanger);
        } else if sugar >= thr.sugar_hi {
            flags.push(Flag::SugarHigh);
        }
    }

    if let Reading::Value(spo2) = entry.numeric(MetricId::Spo2) {
        if spo2 < thr.spo2_lo {
            flags.push(Flag::LowOxygen);
        }
    }

    if let Reading::Value(rr) = entry.numeric(MetricId::Rr) {
        if rr < thr.rr_lo || rr > thr.rr_hi {
            flags.push(Flag::RrAbnormal);
        }
    }

    flags
}

/// Join flag labels for display.
///
/// A non-empty result is the caller's signal to raise a warning (visual,
/// and optionally audible); the core performs no alerting itself.
pub fn flag_line(flags: &[Flag]) -> String {
    flags
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}
