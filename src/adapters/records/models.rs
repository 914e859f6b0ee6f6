//! Field metadata and JSON value conversion shared by record sources
//!
//! Both sources see raw rows as JSON objects (the memory dataset natively,
//! PostgreSQL through `to_jsonb`) and turn them into [`FieldValue`]s using
//! the declared kind of each field.

use crate::domain::filter::parse_timestamp;
use crate::domain::record::{FieldValue, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locale preferred when a text column holds per-language translations
pub const DEFAULT_LANG: &str = "en_US";

/// Declared type of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Monetary,
    Char,
    Text,
    Html,
    Selection,
    Date,
    Datetime,
    Many2one,
    One2many,
    Many2many,
    /// Any type without a dedicated conversion (binary, json, reference, ...)
    #[serde(other)]
    Other,
}

impl FieldKind {
    /// Maps the host framework's `ttype` column
    pub fn from_ttype(ttype: &str) -> Self {
        match ttype {
            "boolean" => FieldKind::Boolean,
            "integer" => FieldKind::Integer,
            "float" => FieldKind::Float,
            "monetary" => FieldKind::Monetary,
            "char" => FieldKind::Char,
            "text" => FieldKind::Text,
            "html" => FieldKind::Html,
            "selection" => FieldKind::Selection,
            "date" => FieldKind::Date,
            "datetime" => FieldKind::Datetime,
            "many2one" => FieldKind::Many2one,
            "one2many" => FieldKind::One2many,
            "many2many" => FieldKind::Many2many,
            _ => FieldKind::Other,
        }
    }

    /// Whether the field points at records of another model
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldKind::Many2one | FieldKind::One2many | FieldKind::Many2many
        )
    }

    /// Whether the field holds a collection of related records
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::One2many | FieldKind::Many2many)
    }
}

/// Metadata of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Target model of a relational field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,

    /// Inverse many2one column on the target (one2many)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_field: Option<String>,

    /// Join table (many2many)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_table: Option<String>,

    /// Join column pointing at this model (many2many)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column1: Option<String>,

    /// Join column pointing at the target model (many2many)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column2: Option<String>,
}

impl FieldSpec {
    /// Metadata for a non-relational field
    pub fn scalar(kind: FieldKind) -> Self {
        Self {
            kind,
            relation: None,
            relation_field: None,
            relation_table: None,
            column1: None,
            column2: None,
        }
    }

    /// Metadata for a relational field
    pub fn relational(kind: FieldKind, relation: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            ..Self::scalar(kind)
        }
    }
}

/// Converts a raw JSON cell into a scalar [`FieldValue`]
///
/// `kind` is `None` for fields without metadata; their shape is inferred
/// from the JSON type. Relational kinds are not handled here.
pub fn scalar_value(kind: Option<FieldKind>, raw: &Value) -> FieldValue {
    match kind {
        Some(FieldKind::Boolean) => FieldValue::Boolean(raw.as_bool().unwrap_or(false)),
        Some(FieldKind::Integer) => FieldValue::Integer(raw.as_i64().unwrap_or(0)),
        Some(FieldKind::Float | FieldKind::Monetary) => {
            FieldValue::Float(raw.as_f64().unwrap_or(0.0))
        }
        Some(FieldKind::Date) => match raw.as_str().and_then(parse_date) {
            Some(date) => FieldValue::Date(date),
            None => FieldValue::Null,
        },
        Some(FieldKind::Datetime) => match raw.as_str().and_then(parse_timestamp) {
            Some(ts) => FieldValue::Timestamp(ts),
            None => FieldValue::Null,
        },
        Some(
            FieldKind::Char | FieldKind::Text | FieldKind::Html | FieldKind::Selection,
        ) => text_value(raw),
        Some(_) | None => inferred_value(raw),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.get(..10)?, DATE_FORMAT).ok()
}

/// Text cell; translated columns are objects keyed by locale
fn text_value(raw: &Value) -> FieldValue {
    match raw {
        Value::String(s) if s.is_empty() => FieldValue::Null,
        Value::String(s) => FieldValue::text(s.as_str()),
        Value::Object(translations) => translations
            .get(DEFAULT_LANG)
            .or_else(|| translations.values().next())
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(FieldValue::text)
            .unwrap_or(FieldValue::Null),
        Value::Null | Value::Bool(false) => FieldValue::Null,
        other => FieldValue::text(other.to_string()),
    }
}

fn inferred_value(raw: &Value) -> FieldValue {
    match raw {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) if s.is_empty() => FieldValue::Null,
        Value::String(s) => FieldValue::text(s.as_str()),
        other => FieldValue::text(other.to_string()),
    }
}

/// Ids referenced by a raw relational cell
///
/// Accepts a bare id, `[id, "name"]` pairs, a list of ids, and treats
/// `null`/`false` as no reference.
pub fn referenced_ids(kind: FieldKind, raw: &Value) -> Vec<i64> {
    match raw {
        Value::Number(n) => n.as_i64().into_iter().collect(),
        Value::Array(items) if kind == FieldKind::Many2one => {
            items.first().and_then(Value::as_i64).into_iter().collect()
        }
        Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}
