//! Observation data model
//!
//! An entry is one timestamped set of recorded vitals plus an optional memo.
//! Metric fields are tagged values rather than raw JSON so presence and type
//! checks are structural; keys the core does not know round-trip untouched.

use crate::catalog::MetricId;
use crate::composite::parse_composite;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Timestamp format written by [`Entry::at`], ISO-8601 with second precision.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A recorded metric value.
///
/// Untagged on the wire: JSON numbers load as `Int` when integral and
/// `Float` otherwise, JSON strings load as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value; `Text` has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Text(_) => None,
        }
    }

    /// Display form for table projection.
    pub fn display(&self) -> String {
        match self {
            MetricValue::Int(v) => v.to_string(),
            MetricValue::Float(v) => v.to_string(),
            MetricValue::Text(v) => v.clone(),
        }
    }

    /// Convert a raw JSON value. Non-scalar values are not metric values.
    fn from_json(value: &Value) -> Option<MetricValue> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetricValue::Int(i))
                } else {
                    n.as_f64().map(MetricValue::Float)
                }
            }
            Value::String(s) => Some(MetricValue::Text(s.clone())),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            MetricValue::Int(v) => Value::from(*v),
            MetricValue::Float(v) => Value::from(*v),
            MetricValue::Text(v) => Value::String(v.clone()),
        }
    }
}

/// Result of reading one metric field off an entry.
///
/// Distinguishes a field that was never recorded (`Absent`) from one that is
/// present but unusable for the requested shape (`Malformed`). Both are
/// skipped by flag and series computation; tests can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading<T> {
    Value(T),
    Absent,
    Malformed,
}

impl<T> Reading<T> {
    /// The usable value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Absent | Reading::Malformed => None,
        }
    }
}

/// One observation: timestamp, typed metric fields, optional memo.
///
/// Entries are immutable once appended; the only lifecycle operations are
/// append and delete. `id` is absent only on legacy records that predate id
/// assignment (see `EntryStore::backfill_ids`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct Entry {
    /// Stable unique handle, assigned by the store on first append.
    pub id: Option<String>,
    /// Observation time, ISO-8601 with second precision, local wall clock.
    pub ts: String,
    /// Free-text memo.
    pub memo: Option<String>,
    metrics: BTreeMap<MetricId, MetricValue>,
    extra: Map<String, Value>,
}

impl Entry {
    /// New empty entry with a raw timestamp string.
    pub fn new(ts: impl Into<String>) -> Entry {
        Entry {
            id: None,
            ts: ts.into(),
            memo: None,
            metrics: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// New empty entry observed at the given time.
    pub fn at(ts: NaiveDateTime) -> Entry {
        Entry::new(ts.format(TS_FORMAT).to_string())
    }

    /// Parsed observation time. `None` excludes the entry from every
    /// range-based view while leaving it in the collection.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.ts)
    }

    /// Record a metric value. Blank text is never stored.
    pub fn set(&mut self, id: MetricId, value: MetricValue) {
        if let MetricValue::Text(text) = &value {
            if text.trim().is_empty() {
                return;
            }
        }
        self.metrics.insert(id, value);
    }

    pub fn get(&self, id: MetricId) -> Option<&MetricValue> {
        self.metrics.get(&id)
    }

    pub fn has(&self, id: MetricId) -> bool {
        self.metrics.contains_key(&id)
    }

    pub fn remove(&mut self, id: MetricId) -> Option<MetricValue> {
        self.metrics.remove(&id)
    }

    /// Present metric fields in catalog order.
    pub fn metrics(&self) -> impl Iterator<Item = (MetricId, &MetricValue)> {
        self.metrics.iter().map(|(id, value)| (*id, value))
    }

    /// Read a scalar metric as a number.
    pub fn numeric(&self, id: MetricId) -> Reading<f64> {
        match self.metrics.get(&id) {
            None => Reading::Absent,
            Some(value) => match value.as_f64() {
                Some(v) => Reading::Value(v),
                None => Reading::Malformed,
            },
        }
    }

    /// Read a composite metric as its two integer components.
    pub fn composite(&self, id: MetricId) -> Reading<(i64, i64)> {
        match self.metrics.get(&id) {
            None => Reading::Absent,
            Some(MetricValue::Text(text)) => match parse_composite(text) {
                Some(pair) => Reading::Value(pair),
                None => Reading::Malformed,
            },
            Some(_) => Reading::Malformed,
        }
    }

    /// Keys the core does not interpret, preserved for round-trip.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// On-disk mirror of an entry: one flat JSON object.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawEntry {
    fields: Map<String, Value>,
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Entry {
        let mut fields = raw.fields;
        let id = match fields.remove("id") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let ts = match fields.remove("ts") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let memo = match fields.remove("memo") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        let mut metrics = BTreeMap::new();
        let mut extra = Map::new();
        for (key, value) in fields {
            let parsed = match MetricId::from_key(&key) {
                Some(id) => MetricValue::from_json(&value).map(|v| (id, v)),
                None => None,
            };
            match parsed {
                Some((id, metric_value)) => {
                    metrics.insert(id, metric_value);
                }
                None => {
                    extra.insert(key, value);
                }
            }
        }

        Entry {
            id,
            ts,
            memo,
            metrics,
            extra,
        }
    }
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> RawEntry {
        let mut fields = Map::new();
        if let Some(id) = entry.id {
            fields.insert("id".to_string(), Value::String(id));
        }
        fields.insert("ts".to_string(), Value::String(entry.ts));
        for (id, value) in entry.metrics {
            fields.insert(id.as_str().to_string(), value.to_json());
        }
        if let Some(memo) = entry.memo {
            fields.insert("memo".to_string(), Value::String(memo));
        }
        for (key, value) in entry.extra {
            fields.insert(key, value);
        }
        RawEntry { fields }
    }
}

/// Persisted entry collection: `{"entries": [...]}` plus any top-level keys
/// the core does not interpret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryLog {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parse a stored timestamp: ISO-8601 with a `T` or space separator,
/// optional fractional seconds, seconds optional.
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    let s = ts.trim();
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}
