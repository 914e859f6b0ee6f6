//! Field path resolution
//!
//! Resolves a [`FieldPath`] against a [`Record`] snapshot, walking relation
//! hops for slash-delimited paths. Missing data never aborts an export:
//! [`resolve`] collapses every [`LookupError`] into an empty value, while
//! [`try_resolve`] keeps the reason for callers that want it.

use crate::domain::ids::FieldPath;
use crate::domain::record::{FieldValue, Record};
use thiserror::Error;

/// Why a field path could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The record has no such field
    #[error("field '{field}' not found on {model}")]
    MissingField { model: String, field: String },

    /// A hop went through a value that is not a relation
    #[error("cannot traverse '{segment}' through a non-relational value")]
    NotTraversable { segment: String },

    /// A hop went through a collection holding more than one record
    #[error("cannot traverse '{segment}' through {count} records")]
    NotSingleton { segment: String, count: usize },

    /// The path contains an empty segment (`a//b`)
    #[error("empty segment in field path '{path}'")]
    EmptySegment { path: String },
}

/// Resolves a field path, mapping every failure to an empty value
///
/// # Examples
///
/// ```
/// use sheets_export::core::format::resolve;
/// use sheets_export::domain::{FieldPath, FieldValue, ModelName, Record, RecordId};
///
/// let record = Record::new(ModelName::new("res.partner").unwrap(), RecordId::new(1).unwrap())
///     .with_field("name", FieldValue::text("Alice"));
///
/// assert_eq!(resolve(&record, &FieldPath::new("name").unwrap()), FieldValue::text("Alice"));
/// assert_eq!(resolve(&record, &FieldPath::new("missing").unwrap()), FieldValue::empty());
/// ```
pub fn resolve(record: &Record, path: &FieldPath) -> FieldValue {
    match try_resolve(record, path) {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(
                record = %record,
                path = %path,
                reason = %e,
                "Field path resolved to empty value"
            );
            FieldValue::empty()
        }
    }
}

/// Resolves a field path, reporting why a lookup failed
///
/// A falsy intermediate value (unset relation, empty collection, `false`,
/// zero, empty text) short-circuits to `Ok` with an empty value: there is
/// nothing to traverse, which is not an error.
pub fn try_resolve(record: &Record, path: &FieldPath) -> Result<FieldValue, LookupError> {
    if !path.is_relational() {
        return lookup(record, path.as_str()).cloned();
    }

    let mut current: Option<&FieldValue> = None;
    for segment in path.segments() {
        if segment.is_empty() {
            return Err(LookupError::EmptySegment {
                path: path.to_string(),
            });
        }

        let target = match current {
            None => record,
            Some(value) if !value.is_truthy() => return Ok(FieldValue::empty()),
            Some(value) => hop(value, segment)?,
        };
        current = Some(lookup(target, segment)?);
    }

    Ok(current.cloned().unwrap_or_else(FieldValue::empty))
}

fn lookup<'a>(record: &'a Record, field: &str) -> Result<&'a FieldValue, LookupError> {
    record.get(field).ok_or_else(|| LookupError::MissingField {
        model: record.model().to_string(),
        field: field.to_string(),
    })
}

fn hop<'a>(value: &'a FieldValue, segment: &str) -> Result<&'a Record, LookupError> {
    match value {
        FieldValue::Reference(Some(record)) => Ok(record.as_ref()),
        FieldValue::References(records) if records.len() == 1 => Ok(records[0].as_ref()),
        FieldValue::References(records) => Err(LookupError::NotSingleton {
            segment: segment.to_string(),
            count: records.len(),
        }),
        _ => Err(LookupError::NotTraversable {
            segment: segment.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{ModelName, RecordId};
    use test_case::test_case;

    fn rec(model: &str, id: i64) -> Record {
        Record::new(ModelName::new(model).unwrap(), RecordId::new(id).unwrap())
    }

    fn path(p: &str) -> FieldPath {
        FieldPath::new(p).unwrap()
    }

    /// sale.order -> res.partner -> res.country, plus tags and lines
    fn order() -> Record {
        let country = rec("res.country", 21).with_field("name", FieldValue::text("Belgium"));
        let partner = rec("res.partner", 7)
            .with_field("name", FieldValue::text("Alice"))
            .with_field("active", FieldValue::Boolean(false))
            .with_field("country_id", FieldValue::reference(country))
            .with_field("parent_id", FieldValue::Reference(None));
        let line = rec("sale.order.line", 100).with_field("name", FieldValue::text("Desk"));

        rec("sale.order", 1)
            .with_field("name", FieldValue::text("SO001"))
            .with_field("partner_id", FieldValue::reference(partner))
            .with_field("order_line", FieldValue::references([line]))
            .with_field(
                "tag_ids",
                FieldValue::references([
                    rec("crm.tag", 1).with_field("name", FieldValue::text("A")),
                    rec("crm.tag", 2).with_field("name", FieldValue::text("B")),
                ]),
            )
            .with_field("note", FieldValue::Null)
    }

    #[test_case("name", FieldValue::text("SO001") ; "direct field")]
    #[test_case("partner_id/name", FieldValue::text("Alice") ; "one hop")]
    #[test_case("partner_id/country_id/name", FieldValue::text("Belgium") ; "two hops")]
    #[test_case("partner_id/active", FieldValue::Boolean(false) ; "falsy final value is kept")]
    #[test_case("order_line/name", FieldValue::text("Desk") ; "singleton collection hop")]
    #[test_case("partner_id/parent_id", FieldValue::Reference(None) ; "unset final reference")]
    fn test_resolve_success(p: &str, expected: FieldValue) {
        assert_eq!(try_resolve(&order(), &path(p)).unwrap(), expected);
    }

    #[test_case("partner_id/parent_id/name" ; "unset intermediate reference")]
    #[test_case("note/anything" ; "null intermediate value")]
    #[test_case("partner_id/active/name" ; "false intermediate value")]
    fn test_resolve_falsy_intermediate_short_circuits(p: &str) {
        assert_eq!(try_resolve(&order(), &path(p)).unwrap(), FieldValue::empty());
    }

    #[test]
    fn test_missing_direct_field() {
        let err = try_resolve(&order(), &path("missing")).unwrap_err();
        assert!(matches!(err, LookupError::MissingField { ref field, .. } if field == "missing"));
        assert_eq!(resolve(&order(), &path("missing")), FieldValue::empty());
    }

    #[test]
    fn test_missing_nested_field() {
        let err = try_resolve(&order(), &path("partner_id/email")).unwrap_err();
        assert!(matches!(err, LookupError::MissingField { ref model, .. } if model == "res.partner"));
    }

    #[test]
    fn test_traverse_through_scalar() {
        let err = try_resolve(&order(), &path("name/length")).unwrap_err();
        assert!(matches!(err, LookupError::NotTraversable { .. }));
        assert_eq!(resolve(&order(), &path("name/length")), FieldValue::empty());
    }

    #[test]
    fn test_traverse_through_multi_record_collection() {
        let err = try_resolve(&order(), &path("tag_ids/name")).unwrap_err();
        assert_eq!(
            err,
            LookupError::NotSingleton {
                segment: "name".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_empty_segment() {
        let err = try_resolve(&order(), &path("partner_id//name")).unwrap_err();
        assert!(matches!(err, LookupError::EmptySegment { .. }));
    }

    #[test]
    fn test_resolve_never_fails() {
        let record = order();
        for p in ["", "/", "a/b/c", "tag_ids/x/y", "partner_id/country_id/name/x"] {
            if let Ok(p) = FieldPath::new(p) {
                let _ = resolve(&record, &p);
            }
        }
    }
}
