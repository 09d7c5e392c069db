//! Composite value parsing
//!
//! Blood pressure is recorded as a single "systolic/diastolic" text field.
//! This module splits such composites into their numeric components.

/// Parse a two-component composite like `"120/80"`.
///
/// Accepts exactly two integer components separated by one slash, each
/// optionally surrounded by whitespace. Anything else (missing slash, extra
/// slash, empty or non-integer component) yields `None` -- malformed input
/// is a non-value, never an error, and there is no partial success.
pub fn parse_composite(text: &str) -> Option<(i64, i64)> {
    let mut parts = text.split('/');
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let a = first.trim().parse::<i64>().ok()?;
    let b = second.trim().parse::<i64>().ok()?;
    Some((a, b))
}
