//! Record types shared by every source: the raw JSON shape a store hands back,
//! the normalized shape the aggregate holds, and the delete outcome.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A record exactly as its store returned it.
pub type RawRecord = serde_json::Map<String, Value>;

/// Which content category (and therefore which source) a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKey {
    Jobs,
    Rent,
    Cv,
    Forum,
    News,
}

impl SourceKey {
    pub const ALL: [SourceKey; 5] = [
        SourceKey::Jobs,
        SourceKey::Rent,
        SourceKey::Cv,
        SourceKey::Forum,
        SourceKey::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKey::Jobs => "jobs",
            SourceKey::Rent => "rent",
            SourceKey::Cv => "cv",
            SourceKey::Forum => "forum",
            SourceKey::News => "news",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            SourceKey::Jobs => "Jobs",
            SourceKey::Rent => "Rentals",
            SourceKey::Cv => "CVs",
            SourceKey::Forum => "Forum",
            SourceKey::News => "News",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source key: {0}")]
pub struct UnknownSourceKey(pub String);

impl FromStr for SourceKey {
    type Err = UnknownSourceKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        SourceKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownSourceKey(t.to_string()))
    }
}

/// Identity of an item inside an aggregate: ids are only unique per source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub source_key: SourceKey,
    pub id: String,
}

impl RecordKey {
    pub fn new(source_key: SourceKey, id: impl Into<String>) -> Self {
        Self {
            source_key,
            id: id.into(),
        }
    }
}

/// The common shape every source adapter produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub source_key: SourceKey,
    pub source_label: String,
    pub title: String,
    /// Labeled optional extras (company, contact, link, ...). Absent values are omitted.
    pub secondary_fields: BTreeMap<String, String>,
    pub body: String,
    pub images: Vec<String>,
    /// Epoch zero when the raw record carried no usable timestamp.
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<String>,
    pub owner_email: Option<String>,
}

impl NormalizedRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.source_key, self.id.clone())
    }
}

/// Result of asking a store to delete one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Forbidden,
    TransientFailure,
}

impl DeleteOutcome {
    /// Whether the item should disappear from the rendered aggregate.
    pub fn removes_from_view(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted | DeleteOutcome::NotFound)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "deleted",
            DeleteOutcome::NotFound => "not_found",
            DeleteOutcome::Forbidden => "forbidden",
            DeleteOutcome::TransientFailure => "transient_failure",
        }
    }
}

/// Field names a record id may be stored under, in precedence order.
pub const ID_ALIASES: [&str; 3] = ["id", "uuid", "_id"];

/// Render a scalar JSON value as a trimmed, non-empty string.
pub(crate) fn scalar_to_string(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// First alias whose value is a usable scalar.
pub(crate) fn first_scalar<S: AsRef<str>>(raw: &RawRecord, aliases: &[S]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|a| raw.get(a.as_ref()))
        .find_map(scalar_to_string)
}

// Values above this are taken as epoch milliseconds (Date.now() style).
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse the timestamp encodings sources are known to use.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(n) = s.parse::<i64>() {
                return from_epoch(n);
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Object(o) => {
            let secs = o
                .get("seconds")
                .or_else(|| o.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = o
                .get("nanoseconds")
                .or_else(|| o.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(secs, u32::try_from(nanos).unwrap_or(0))
                .single()
        }
        _ => None,
    }
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() > MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

/// 1970-01-01T00:00:00Z, used when a record has no usable timestamp.
pub fn epoch_zero() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}
