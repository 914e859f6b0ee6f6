//! Record snapshots and field values
//!
//! A [`Record`] is an immutable snapshot of one business entity as
//! materialized by a record source. Relational fields hold nested record
//! snapshots, expanded only as deep as the requested field paths need.

use super::ids::{ModelName, RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field that carries a record's human-readable label
pub const DISPLAY_NAME_FIELD: &str = "name";

/// Timestamp layout used for display
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used for display
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One field value of a record
///
/// This is the closed set of runtime shapes a field can take. Relational
/// values carry the related records themselves so that slash-delimited
/// paths can be walked without going back to the data layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent, null or unset value
    Null,
    /// Boolean flag
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Floating point number (float and monetary fields)
    Float(f64),
    /// Text (char, text, selection and html fields)
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Naive UTC timestamp
    Timestamp(NaiveDateTime),
    /// Single related record; `None` when the relation is unset
    Reference(Option<Arc<Record>>),
    /// Collection of related records, in relation order
    References(Vec<Arc<Record>>),
}

impl FieldValue {
    /// Empty text value, the result of any failed lookup
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// Builds a text value
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Builds a single reference to a record
    pub fn reference(record: Record) -> Self {
        FieldValue::Reference(Some(Arc::new(record)))
    }

    /// Builds a collection of references
    pub fn references(records: impl IntoIterator<Item = Record>) -> Self {
        FieldValue::References(records.into_iter().map(Arc::new).collect())
    }

    /// Whether the value counts as "set"
    ///
    /// Null, `false`, zero, empty text and empty relations are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Boolean(b) => *b,
            FieldValue::Integer(i) => *i != 0,
            FieldValue::Float(f) => *f != 0.0,
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Date(_) | FieldValue::Timestamp(_) => true,
            FieldValue::Reference(r) => r.is_some(),
            FieldValue::References(rs) => !rs.is_empty(),
        }
    }
}

/// Plain string form of a value
///
/// Integral floats keep a trailing `.0` and relations print their record
/// handles (`res.partner(7,)`).
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            FieldValue::Reference(Some(record)) => write!(f, "{record}"),
            FieldValue::Reference(None) => Ok(()),
            FieldValue::References(records) => {
                for (i, record) in records.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{record}")?;
                }
                Ok(())
            }
        }
    }
}

/// Capability of presenting a human-readable label
pub trait HasDisplayName {
    /// The label, or `None` when the entity has no label field at all
    ///
    /// A label field that is present but unset yields `Some("")`.
    fn display_name(&self) -> Option<String>;
}

/// Snapshot of one business entity
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: ModelName,
    id: RecordId,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates a record without fields
    pub fn new(model: ModelName, id: RecordId) -> Self {
        Self {
            model,
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Sets a field, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Model this record belongs to
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    /// Record id
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Number of loaded fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is loaded
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl HasDisplayName for Record {
    fn display_name(&self) -> Option<String> {
        self.fields.get(DISPLAY_NAME_FIELD).map(|value| match value {
            FieldValue::Null | FieldValue::Boolean(false) => String::new(),
            other => other.to_string(),
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},)", self.model, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner(id: i64) -> Record {
        Record::new(
            ModelName::new("res.partner").unwrap(),
            RecordId::new(id).unwrap(),
        )
    }

    #[test]
    fn test_truthiness() {
        assert!(!FieldValue::Null.is_truthy());
        assert!(!FieldValue::Boolean(false).is_truthy());
        assert!(!FieldValue::Integer(0).is_truthy());
        assert!(!FieldValue::Float(0.0).is_truthy());
        assert!(!FieldValue::empty().is_truthy());
        assert!(!FieldValue::Reference(None).is_truthy());
        assert!(!FieldValue::References(vec![]).is_truthy());

        assert!(FieldValue::Boolean(true).is_truthy());
        assert!(FieldValue::Integer(-1).is_truthy());
        assert!(FieldValue::text("x").is_truthy());
        assert!(FieldValue::reference(partner(1)).is_truthy());
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Float(2.0).to_string(), "2.0");
        assert_eq!(FieldValue::Float(1.25).to_string(), "1.25");
        assert_eq!(
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).to_string(),
            "2024-03-09"
        );
    }

    #[test]
    fn test_record_display_handle() {
        assert_eq!(partner(7).to_string(), "res.partner(7,)");
    }

    #[test]
    fn test_display_name() {
        let named = partner(1).with_field("name", FieldValue::text("Alice"));
        assert_eq!(named.display_name(), Some("Alice".to_string()));

        let unset = partner(2).with_field("name", FieldValue::Boolean(false));
        assert_eq!(unset.display_name(), Some(String::new()));

        assert_eq!(partner(3).display_name(), None);
    }

    #[test]
    fn test_record_fields() {
        let mut record = partner(1).with_field("name", FieldValue::text("Alice"));
        record.insert("active", FieldValue::Boolean(true));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("active"), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get("missing"), None);
    }
}
