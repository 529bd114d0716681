//! Declarative per-entity form schemas and their synchronous validation.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use db::models::{
    record::{EntityRecord, FieldValue, Fields},
    table::Table,
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid email regex"));

const INVALID_VALUE: &str = "Valor inválido";

/// Raw form input keyed by field name
pub type FormValues = BTreeMap<String, String>;

/// How a field's accepted input is normalised into a [`FieldValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM`, kept as text
    Time,
    /// Holds the id of a record in another table
    Reference(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    OneOf(&'static [&'static str]),
    NonNegative,
    Positive,
}

impl Rule {
    fn accepts(&self, raw: &str) -> bool {
        match self {
            Rule::Required => !raw.is_empty(),
            Rule::MinLength(min) => raw.chars().count() >= *min,
            Rule::MaxLength(max) => raw.chars().count() <= *max,
            Rule::Email => EMAIL_RE.is_match(raw),
            Rule::OneOf(options) => options.contains(&raw),
            Rule::NonNegative => parse_number(raw).is_some_and(|n| n >= 0.0),
            Rule::Positive => parse_number(raw).is_some_and(|n| n > 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub rule: Rule,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDefault {
    Empty,
    Value(&'static str),
    Today,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<FieldRule>,
    pub optional: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            rules: Vec::new(),
            optional: false,
            default: FieldDefault::Empty,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn time(name: &'static str) -> Self {
        Self::new(name, FieldKind::Time)
    }

    pub fn reference(name: &'static str, table: Table) -> Self {
        Self::new(name, FieldKind::Reference(table))
    }

    pub fn rule(mut self, rule: Rule, message: &'static str) -> Self {
        self.rules.push(FieldRule { rule, message });
        self
    }

    pub fn required(self, message: &'static str) -> Self {
        self.rule(Rule::Required, message)
    }

    pub fn min_len(self, min: usize, message: &'static str) -> Self {
        self.rule(Rule::MinLength(min), message)
    }

    pub fn max_len(self, max: usize, message: &'static str) -> Self {
        self.rule(Rule::MaxLength(max), message)
    }

    pub fn email(self, message: &'static str) -> Self {
        self.rule(Rule::Email, message)
    }

    pub fn one_of(self, options: &'static [&'static str], message: &'static str) -> Self {
        self.rule(Rule::OneOf(options), message)
    }

    pub fn non_negative(self, message: &'static str) -> Self {
        self.rule(Rule::NonNegative, message)
    }

    pub fn positive(self, message: &'static str) -> Self {
        self.rule(Rule::Positive, message)
    }

    /// Empty input is accepted and stored as [`FieldValue::Null`]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = FieldDefault::Value(value);
        self
    }

    pub fn default_today(mut self) -> Self {
        self.default = FieldDefault::Today;
        self
    }

    fn default_input(&self) -> String {
        match self.default {
            FieldDefault::Empty => String::new(),
            FieldDefault::Value(value) => value.to_string(),
            FieldDefault::Today => Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }

    /// Message reported when input passes every rule but cannot be normalised
    fn invalid_message(&self) -> &'static str {
        self.rules.first().map_or(INVALID_VALUE, |r| r.message)
    }

    fn check(&self, raw: &str) -> Result<FieldValue, &'static str> {
        if raw.is_empty() && self.optional {
            return Ok(FieldValue::Null);
        }
        if let Some(violated) = self.rules.iter().find(|r| !r.rule.accepts(raw)) {
            return Err(violated.message);
        }
        self.normalize(raw).ok_or_else(|| self.invalid_message())
    }

    fn normalize(&self, raw: &str) -> Option<FieldValue> {
        match self.kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Number => parse_number(raw).map(FieldValue::Number),
            FieldKind::Integer => parse_number(raw)
                .filter(|n| n.fract() == 0.0)
                .map(FieldValue::Number),
            FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(FieldValue::Date),
            FieldKind::Time => NaiveTime::parse_from_str(raw, "%H:%M")
                .ok()
                .map(|t| FieldValue::Text(t.format("%H:%M").to_string())),
            FieldKind::Reference(_) => raw
                .parse::<i64>()
                .ok()
                .map(|id| FieldValue::Number(id as f64)),
        }
    }
}

/// Parse a non-empty decimal, accepting a comma as decimal separator (`24,50`)
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replacen(',', ".", 1)
    } else {
        raw.to_string()
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Field name to the message of its first violated rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid fields: {}", summarize(.0))]
pub struct ValidationErrors(pub BTreeMap<String, String>);

fn summarize(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Field set that passed its schema; the only input the resource controllers accept
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFields {
    table: Table,
    fields: Fields,
}

impl ValidatedFields {
    pub fn table(&self) -> Table {
        self.table
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    table: Table,
    fields: Vec<FieldSpec>,
}

impl EntitySchema {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Form state for a new record
    pub fn defaults(&self) -> FormValues {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default_input()))
            .collect()
    }

    /// Form state copied from an existing record; the record itself is untouched
    pub fn seed_from(&self, record: &EntityRecord) -> FormValues {
        self.fields
            .iter()
            .map(|f| {
                let value = record
                    .get(f.name)
                    .map(FieldValue::to_form_string)
                    .unwrap_or_default();
                (f.name.to_string(), value)
            })
            .collect()
    }

    /// Check every field in schema order. Input is trimmed, missing fields count as
    /// empty and fields outside the schema are dropped.
    pub fn validate(&self, values: &FormValues) -> Result<ValidatedFields, ValidationErrors> {
        let mut fields = Fields::new();
        let mut errors = BTreeMap::new();

        for spec in &self.fields {
            let raw = values.get(spec.name).map(|v| v.trim()).unwrap_or("");
            match spec.check(raw) {
                Ok(value) => {
                    fields.insert(spec.name.to_string(), value);
                }
                Err(message) => {
                    errors.insert(spec.name.to_string(), message.to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(ValidatedFields {
                table: self.table,
                fields,
            })
        } else {
            Err(ValidationErrors(errors))
        }
    }
}
