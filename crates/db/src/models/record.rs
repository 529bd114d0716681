use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use ts_rs::TS;

/// Opaque record identifier, unique within one table
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Scalar value held by a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Interpret the value as a foreign reference to another record
    pub fn as_record_id(&self) -> Option<RecordId> {
        match self {
            Self::Number(number) if number.fract() == 0.0 => Some(RecordId(*number as i64)),
            Self::Text(text) => text.trim().parse().ok().map(RecordId),
            _ => None,
        }
    }

    /// Render the value the way a form input holds it
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                format!("{}", *number as i64)
            }
            Self::Number(number) => number.to_string(),
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<RecordId> for FieldValue {
    fn from(value: RecordId) -> Self {
        Self::Number(value.0 as f64)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Referenced record resolved by the gateway at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct JoinedRecord {
    pub id: RecordId,
    pub fields: Fields,
}

impl JoinedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// One row of an entity collection
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct EntityRecord {
    pub id: RecordId,
    pub fields: Fields,
    /// Join alias to the referenced record; `None` when the reference dangles
    #[serde(default)]
    pub joined: BTreeMap<String, Option<JoinedRecord>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityRecord {
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self {
            id,
            fields,
            joined: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.get(field).and_then(FieldValue::as_date)
    }

    pub fn joined(&self, alias: &str) -> Option<&JoinedRecord> {
        self.joined.get(alias).and_then(Option::as_ref)
    }

    pub fn as_joined(&self) -> JoinedRecord {
        JoinedRecord {
            id: self.id,
            fields: self.fields.clone(),
        }
    }
}
