use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Column holding the soft-delete marker
pub const DELETED_AT: &str = "deleted_at";

/// Soft-delete state of a row whose model supports soft deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SoftDeleteState {
    Active,
    Trashed { since: DateTime<Utc> },
}

impl SoftDeleteState {
    pub fn is_trashed(&self) -> bool {
        matches!(self, SoftDeleteState::Trashed { .. })
    }

    fn to_value(self) -> Value {
        match self {
            SoftDeleteState::Active => Value::Null,
            SoftDeleteState::Trashed { since } => Value::String(since.to_rfc3339()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Row is not a JSON object")]
    NotAnObject,

    #[error("Row is missing an integer 'id'")]
    MissingId,

    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },
}

/// A single persisted row.
///
/// `deletion` is `None` for models without soft deletes; for soft-deletable
/// models it is always `Some`, so a row is either active or trashed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub attributes: Map<String, Value>,
    pub deletion: Option<SoftDeleteState>,
}

impl Record {
    pub fn new(id: i64, attributes: Map<String, Value>, soft_deletes: bool) -> Self {
        Self {
            id,
            attributes,
            deletion: soft_deletes.then_some(SoftDeleteState::Active),
        }
    }

    /// Build from a raw row object such as `row_to_json` output.
    /// A `deleted_at` key marks the row as soft-deletable.
    pub fn from_row(value: Value) -> Result<Self, RecordError> {
        let Value::Object(mut map) = value else {
            return Err(RecordError::NotAnObject);
        };

        let id = map
            .remove("id")
            .and_then(|v| v.as_i64())
            .ok_or(RecordError::MissingId)?;

        let deletion = match map.remove(DELETED_AT) {
            None => None,
            Some(Value::Null) => Some(SoftDeleteState::Active),
            Some(Value::String(raw)) => {
                let since = parse_timestamp(&raw).ok_or_else(|| RecordError::InvalidTimestamp {
                    field: DELETED_AT.to_string(),
                    value: raw.clone(),
                })?;
                Some(SoftDeleteState::Trashed { since })
            }
            Some(other) => {
                return Err(RecordError::InvalidTimestamp {
                    field: DELETED_AT.to_string(),
                    value: other.to_string(),
                })
            }
        };

        Ok(Self { id, attributes: map, deletion })
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// Value of a column for key comparisons, `id` included
    pub fn key_value(&self, column: &str) -> Option<Value> {
        if column == "id" {
            Some(Value::from(self.id))
        } else {
            self.attributes.get(column).filter(|v| !v.is_null()).cloned()
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.deletion.map(|d| d.is_trashed()).unwrap_or(false)
    }

    pub fn supports_soft_deletes(&self) -> bool {
        self.deletion.is_some()
    }

    /// The row's natural array form: `id`, every attribute, then `deleted_at`
    /// for soft-deletable models.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::from(self.id));
        for (k, v) in &self.attributes {
            obj.insert(k.clone(), v.clone());
        }
        if let Some(deletion) = self.deletion {
            obj.insert(DELETED_AT.into(), deletion.to_value());
        }
        Value::Object(obj)
    }
}

/// Compare two key values loosely, so `"7"` matches `7`
pub fn keys_match(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_i64().is_some() && a.as_i64() == b.as_i64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.as_i64().map(|n| n.to_string() == *s).unwrap_or(false)
        }
        _ => false,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // row_to_json renders timestamptz without the 'T' separator in some locales
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
