//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow through an export:
//! model names, record ids, field paths and spreadsheet keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between relation hops in a [`FieldPath`]
pub const PATH_SEPARATOR: char = '/';

/// Model name newtype wrapper
///
/// A dotted technical model name such as `res.partner` or `sale.order`.
///
/// # Examples
///
/// ```
/// use sheets_export::domain::ids::ModelName;
///
/// let model = ModelName::new("res.partner").unwrap();
/// assert_eq!(model.table_name(), "res_partner");
/// assert!(ModelName::new("res partner").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName(String);

impl ModelName {
    /// Creates a new ModelName, accepting lowercase ASCII letters, digits,
    /// underscores and dots
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        let valid = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
        if !valid || name.starts_with('.') || name.ends_with('.') || name.contains("..") {
            return Err(format!("Invalid model name: {name}"));
        }

        Ok(Self(name))
    }

    /// Returns the model name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Database table backing this model (`res.partner` -> `res_partner`)
    pub fn table_name(&self) -> String {
        self.0.replace('.', "_")
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ModelName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelName> for String {
    fn from(value: ModelName) -> Self {
        value.0
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record identifier
///
/// Database ids are strictly positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a new RecordId
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("Record ID must be positive, got {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the raw integer id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Invalid record ID: {s}"))?;
        Self::new(id)
    }
}

impl TryFrom<i64> for RecordId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for i64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// Field path newtype wrapper
///
/// Either a direct field name (`name`) or a slash-delimited chain of
/// relation hops (`partner_id/country_id/name`).
///
/// # Examples
///
/// ```
/// use sheets_export::domain::ids::FieldPath;
///
/// let path = FieldPath::new("partner_id/country_id/name").unwrap();
/// assert!(path.is_relational());
/// assert_eq!(path.segments().collect::<Vec<_>>(), vec!["partner_id", "country_id", "name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Creates a new FieldPath
    pub fn new(path: impl Into<String>) -> Result<Self, String> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err("Field path cannot be empty".to_string());
        }
        Ok(Self(path))
    }

    /// Returns the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path traverses at least one relation
    pub fn is_relational(&self) -> bool {
        self.0.contains(PATH_SEPARATOR)
    }

    /// Iterates over the path segments in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Google spreadsheet key
///
/// The identifier found in a spreadsheet URL between `/d/` and `/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    /// Creates a new SpreadsheetId
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err("Spreadsheet ID cannot be empty".to_string());
        }

        let valid = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(format!("Invalid spreadsheet ID: {id}"));
        }

        Ok(Self(id))
    }

    /// Returns the spreadsheet key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpreadsheetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SpreadsheetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_valid() {
        let model = ModelName::new("sale.order.line").unwrap();
        assert_eq!(model.as_str(), "sale.order.line");
        assert_eq!(model.table_name(), "sale_order_line");
        assert_eq!(model.to_string(), "sale.order.line");
    }

    #[test]
    fn test_model_name_invalid() {
        assert!(ModelName::new("").is_err());
        assert!(ModelName::new("res.Partner").is_err());
        assert!(ModelName::new("res..partner").is_err());
        assert!(ModelName::new(".partner").is_err());
        assert!(ModelName::new("res_partner; DROP TABLE x").is_err());
    }

    #[test]
    fn test_model_name_serde() {
        let model: ModelName = serde_json::from_str("\"res.partner\"").unwrap();
        assert_eq!(model.as_str(), "res.partner");
        assert!(serde_json::from_str::<ModelName>("\"Bad Name\"").is_err());
    }

    #[test]
    fn test_record_id() {
        assert_eq!(RecordId::new(7).unwrap().get(), 7);
        assert!(RecordId::new(0).is_err());
        assert!(RecordId::new(-3).is_err());
        assert_eq!(RecordId::from_str(" 42 ").unwrap().get(), 42);
        assert!(RecordId::from_str("abc").is_err());
    }

    #[test]
    fn test_record_id_serde() {
        let ids: Vec<RecordId> = serde_json::from_str("[3, 1, 2]").unwrap();
        assert_eq!(ids.iter().map(|id| id.get()).collect::<Vec<_>>(), vec![3, 1, 2]);
        assert!(serde_json::from_str::<RecordId>("0").is_err());
    }

    #[test]
    fn test_field_path() {
        let direct = FieldPath::new("name").unwrap();
        assert!(!direct.is_relational());
        assert_eq!(direct.segments().count(), 1);

        let hop = FieldPath::new("order_id/partner_id/name").unwrap();
        assert!(hop.is_relational());
        assert_eq!(hop.segments().last(), Some("name"));

        assert!(FieldPath::new("  ").is_err());
    }

    #[test]
    fn test_spreadsheet_id() {
        let id = SpreadsheetId::new(" 1AbC-d_9 ").unwrap();
        assert_eq!(id.as_str(), "1AbC-d_9");
        assert!(SpreadsheetId::new("").is_err());
        assert!(SpreadsheetId::new("abc/def").is_err());
    }
}
