//! Threshold and profile configuration
//!
//! Named numeric limits, the active input metrics, and the single-value
//! profile used for BMI derivation. Loading is fail-open: an absent or
//! malformed document falls back to built-in defaults, and a
//! partially-written document fills its gaps from defaults. Callers load
//! once and pass these down explicitly; there is no global state.

use crate::catalog::MetricId;
use serde::{Deserialize, Serialize};

/// Named numeric limits used to classify observations.
///
/// Mutable at any time; every evaluation uses the set it is handed, so an
/// updated limit applies to the next call with no versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Systolic high, flag at or above
    pub bp_sys_hi: f64,
    /// Diastolic high, flag at or above
    pub bp_dia_hi: f64,
    /// Systolic critical, overrides the high flag
    pub bp_sys_very: f64,
    /// Diastolic critical, overrides the high flag
    pub bp_dia_very: f64,
    /// Heart rate low, flag below
    pub hr_lo: f64,
    /// Heart rate high, flag above
    pub hr_hi: f64,
    /// Fever, flag at or above
    pub temp_hi: f64,
    /// Sugar high, flag at or above
    pub sugar_hi: f64,
    /// Sugar critical, overrides the high flag
    pub sugar_very: f64,
    /// Sugar low, danger at or below
    pub sugar_lo: f64,
    /// Oxygen saturation low, flag below
    pub spo2_lo: f64,
    /// Respiration low, flag below
    pub rr_lo: f64,
    /// Respiration high, flag above
    pub rr_hi: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bp_sys_hi: 140.0,
            bp_dia_hi: 90.0,
            bp_sys_very: 180.0,
            bp_dia_very: 120.0,
            hr_lo: 50.0,
            hr_hi: 120.0,
            temp_hi: 38.5,
            sugar_hi: 180.0,
            sugar_very: 240.0,
            sugar_lo: 60.0,
            spo2_lo: 92.0,
            rr_lo: 10.0,
            rr_hi: 24.0,
        }
    }
}

impl Thresholds {
    /// Read one limit by its document key.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "bp_sys_hi" => Some(self.bp_sys_hi),
            "bp_dia_hi" => Some(self.bp_dia_hi),
            "bp_sys_very" => Some(self.bp_sys_very),
            "bp_dia_very" => Some(self.bp_dia_very),
            "hr_lo" => Some(self.hr_lo),
            "hr_hi" => Some(self.hr_hi),
            "temp_hi" => Some(self.temp_hi),
            "sugar_hi" => Some(self.sugar_hi),
            "sugar_very" => Some(self.sugar_very),
            "sugar_lo" => Some(self.sugar_lo),
            "spo2_lo" => Some(self.spo2_lo),
            "rr_lo" => Some(self.rr_lo),
            "rr_hi" => Some(self.rr_hi),
            _ => None,
        }
    }

    /// Update one limit by its document key; `false` for an unknown key.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "bp_sys_hi" => &mut self.bp_sys_hi,
            "bp_dia_hi" => &mut self.bp_dia_hi,
            "bp_sys_very" => &mut self.bp_sys_very,
            "bp_dia_very" => &mut self.bp_dia_very,
            "hr_lo" => &mut self.hr_lo,
            "hr_hi" => &mut self.hr_hi,
            "temp_hi" => &mut self.temp_hi,
            "sugar_hi" => &mut self.sugar_hi,
            "sugar_very" => &mut self.sugar_very,
            "sugar_lo" => &mut self.sugar_lo,
            "spo2_lo" => &mut self.spo2_lo,
            "rr_lo" => &mut self.rr_lo,
            "rr_hi" => &mut self.rr_hi,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Every document key, in declaration order.
    pub const KEYS: [&'static str; 13] = [
        "bp_sys_hi",
        "bp_dia_hi",
        "bp_sys_very",
        "bp_dia_very",
        "hr_lo",
        "hr_hi",
        "temp_hi",
        "sugar_hi",
        "sugar_very",
        "sugar_lo",
        "spo2_lo",
        "rr_lo",
        "rr_hi",
    ];
}

/// Persisted application config: which metrics the input surface exposes
/// and the current thresholds.
///
/// Deselecting a metric does not touch stored data; entries recorded while
/// it was active remain and still display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub metrics: Vec<MetricId>,
    pub thresholds: Thresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metrics: vec![MetricId::Bp, MetricId::Hr, MetricId::Temp, MetricId::Sugar],
            thresholds: Thresholds::default(),
        }
    }
}

impl AppConfig {
    /// Parse a stored config document, falling back to defaults on any
    /// malformed input. Loading never fails.
    pub fn from_json(json: &str) -> AppConfig {
        serde_json::from_str(json).unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// User profile: the single height value BMI derivation reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Height in centimeters; absent or non-positive disables derivation.
    pub height_cm: Option<f64>,
}

impl Profile {
    /// Parse a stored profile document, falling back to the empty profile
    /// on any malformed input.
    pub fn from_json(json: &str) -> Profile {
        serde_json::from_str(json).unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Height in meters when configured and strictly positive.
    pub fn height_m(&self) -> Option<f64> {
        self.height_cm.filter(|h| *h > 0.0).map(|h| h / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_shipped_limits() {
        let thr = Thresholds::default();
        assert_eq!(thr.bp_sys_hi, 140.0);
        assert_eq!(thr.bp_dia_very, 120.0);
        assert_eq!(thr.temp_hi, 38.5);
        assert_eq!(thr.sugar_lo, 60.0);
        assert_eq!(thr.rr_hi, 24.0);

        let config = AppConfig::default();
        assert_eq!(
            config.metrics,
            vec![MetricId::Bp, MetricId::Hr, MetricId::Temp, MetricId::Sugar]
        );
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        assert_eq!(AppConfig::from_json("not json"), AppConfig::default());
        assert_eq!(AppConfig::from_json(""), AppConfig::default());
        assert_eq!(AppConfig::from_json("[1,2,3]"), AppConfig::default());
    }

    #[test]
    fn test_partial_thresholds_fill_from_defaults() {
        let config =
            AppConfig::from_json(r#"{"thresholds": {"hr_lo": 45, "temp_hi": 37.8}}"#);
        assert_eq!(config.thresholds.hr_lo, 45.0);
        assert_eq!(config.thresholds.temp_hi, 37.8);
        assert_eq!(config.thresholds.hr_hi, 120.0);
        assert_eq!(config.metrics, AppConfig::default().metrics);
    }

    #[test]
    fn test_get_set_by_key() {
        let mut thr = Thresholds::default();
        assert!(thr.set("sugar_hi", 170.0));
        assert_eq!(thr.get("sugar_hi"), Some(170.0));
        assert!(!thr.set("unknown", 1.0));
        assert_eq!(thr.get("unknown"), None);
        for key in Thresholds::KEYS {
            assert!(thr.get(key).is_some());
        }
    }

    #[test]
    fn test_profile_height_guard() {
        assert_eq!(Profile { height_cm: None }.height_m(), None);
        assert_eq!(Profile { height_cm: Some(0.0) }.height_m(), None);
        assert_eq!(Profile { height_cm: Some(-170.0) }.height_m(), None);
        assert_eq!(Profile { height_cm: Some(170.0) }.height_m(), Some(1.7));
    }

    #[test]
    fn test_profile_fail_open() {
        assert_eq!(Profile::from_json("garbage"), Profile::default());
        assert_eq!(
            Profile::from_json(r#"{"height_cm": null}"#),
            Profile { height_cm: None }
        );
        assert_eq!(
            Profile::from_json(r#"{"height_cm": 171.5}"#),
            Profile { height_cm: Some(171.5) }
        );
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::default();
        config.metrics.push(MetricId::Spo2);
        config.thresholds.set("hr_hi", 130.0);
        let json = config.to_json().unwrap();
        assert_eq!(AppConfig::from_json(&json), config);
    }
}
