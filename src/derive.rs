//! Derived metrics
//!
//! Body-mass index is computed from the recorded weight and the profile
//! height when it was requested but not supplied directly.

use crate::catalog::MetricId;
use crate::config::Profile;
use crate::types::{Entry, MetricValue};

/// Fill in BMI on an entry being built.
///
/// The value is injected only when a strictly positive height is
/// configured, the entry carries a numeric weight, `bmi` is among the
/// active metrics, and no `bmi` field is already present. Returns the
/// injected value, `None` when derivation was skipped. Idempotent: an
/// existing value is never overwritten.
pub fn derive_bmi(
    entry: &mut Entry,
    profile: &Profile,
    active_metrics: &[MetricId],
) -> Option<f64> {
    if !active_metrics.contains(&MetricId::Bmi) || entry.has(MetricId::Bmi) {
        return None;
    }
    let height_m = profile.height_m()?;
    let weight = entry.numeric(MetricId::Weight).value()?;
    let bmi = round2(weight / (height_m * height_m));
    entry.set(MetricId::Bmi, MetricValue::Float(bmi));
    Some(bmi)
}

/// Round to two decimal places, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reading;
    use pretty_assertions::assert_eq;

    const ACTIVE: [MetricId; 2] = [MetricId::Weight, MetricId::Bmi];

    fn profile(height_cm: Option<f64>) -> Profile {
        Profile { height_cm }
    }

    fn entry_with_weight(weight: f64) -> Entry {
        let mut entry = Entry::new("2024-01-15T09:30:00");
        entry.set(MetricId::Weight, MetricValue::Float(weight));
        entry
    }

    #[test]
    fn test_derives_and_rounds() {
        let mut entry = entry_with_weight(68.0);
        let bmi = derive_bmi(&mut entry, &profile(Some(170.0)), &ACTIVE);
        // 68 / 1.7^2 = 23.529..., rounded to two decimals.
        assert_eq!(bmi, Some(23.53));
        assert_eq!(entry.numeric(MetricId::Bmi), Reading::Value(23.53));
    }

    #[test]
    fn test_skipped_without_height() {
        let mut entry = entry_with_weight(68.0);
        assert_eq!(derive_bmi(&mut entry, &profile(None), &ACTIVE), None);
        assert!(!entry.has(MetricId::Bmi));
    }

    #[test]
    fn test_skipped_on_non_positive_height() {
        let mut entry = entry_with_weight(68.0);
        assert_eq!(derive_bmi(&mut entry, &profile(Some(0.0)), &ACTIVE), None);
        assert!(!entry.has(MetricId::Bmi));
    }

    #[test]
    fn test_skipped_without_weight() {
        let mut entry = Entry::new("2024-01-15T09:30:00");
        assert_eq!(derive_bmi(&mut entry, &profile(Some(170.0)), &ACTIVE), None);
        assert!(!entry.has(MetricId::Bmi));
    }

    #[test]
    fn test_skipped_when_bmi_not_active() {
        let mut entry = entry_with_weight(68.0);
        let active = [MetricId::Weight];
        assert_eq!(derive_bmi(&mut entry, &profile(Some(170.0)), &active), None);
        assert!(!entry.has(MetricId::Bmi));
    }

    #[test]
    fn test_never_overwrites_explicit_value() {
        let mut entry = entry_with_weight(68.0);
        entry.set(MetricId::Bmi, MetricValue::Float(25.0));
        assert_eq!(derive_bmi(&mut entry, &profile(Some(170.0)), &ACTIVE), None);
        assert_eq!(entry.numeric(MetricId::Bmi), Reading::Value(25.0));
    }

    #[test]
    fn test_text_weight_is_not_numeric() {
        let mut entry = Entry::new("2024-01-15T09:30:00");
        entry.set(MetricId::Weight, MetricValue::Text("heavy".to_string()));
        assert_eq!(derive_bmi(&mut entry, &profile(Some(170.0)), &ACTIVE), None);
    }
}
