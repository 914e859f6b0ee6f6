//! Export request and response payloads
//!
//! These are the wire shapes exchanged with the web client's export
//! dialog. Key names are fixed; the client reads `success` first and then
//! either `spreadsheet_url` and `message` or `error`.

use crate::domain::errors::ExportError;
use crate::domain::filter::Domain;
use crate::domain::ids::{FieldPath, ModelName, RecordId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Inbound export request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Technical model name, e.g. `res.partner`
    pub model: String,

    /// Ordered field paths, one column each
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub fields: Vec<String>,

    /// Optional column headers, parallel to `fields`
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub field_labels: Vec<String>,

    /// Explicit record ids; take precedence over `domain`
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub ids: Vec<i64>,

    /// Filter expression in prefix notation
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub domain: Vec<Value>,

    /// Host framework context (language, timezone, ...)
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub context: Map<String, Value>,
}

/// Which records an export covers
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Explicit ids, in the requested order
    Ids(Vec<RecordId>),
    /// Every record matching the filter
    Filter(Domain),
}

impl ExportRequest {
    /// Creates a request for a model and its field paths
    pub fn new(model: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            model: model.into(),
            fields,
            ..Default::default()
        }
    }

    /// Sets the column labels (builder style)
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.field_labels = labels;
        self
    }

    /// Sets the explicit ids (builder style)
    pub fn with_ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = ids;
        self
    }

    /// Sets the filter terms (builder style)
    pub fn with_domain(mut self, domain: Vec<Value>) -> Self {
        self.domain = domain;
        self
    }

    /// Validated model name
    pub fn model_name(&self) -> Result<ModelName, ExportError> {
        ModelName::new(self.model.trim()).map_err(ExportError::InvalidRequest)
    }

    /// Validated field paths; at least one is required
    pub fn field_paths(&self) -> Result<Vec<FieldPath>, ExportError> {
        if self.fields.is_empty() {
            return Err(ExportError::InvalidRequest(
                "At least one field is required".to_string(),
            ));
        }

        self.fields
            .iter()
            .map(|f| FieldPath::new(f.as_str()).map_err(ExportError::InvalidRequest))
            .collect()
    }

    /// Header labels, if any were supplied
    pub fn labels(&self) -> Option<&[String]> {
        if self.field_labels.is_empty() {
            None
        } else {
            Some(&self.field_labels)
        }
    }

    /// Resolves the record selection
    ///
    /// Non-empty ids win over the filter. An empty filter selects nothing.
    ///
    /// # Errors
    ///
    /// [`ExportError::NoSelection`] when neither is given, and
    /// [`ExportError::InvalidRequest`] for non-positive ids or a malformed
    /// filter.
    pub fn selection(&self) -> Result<Selection, ExportError> {
        if !self.ids.is_empty() {
            let ids = self
                .ids
                .iter()
                .map(|id| RecordId::new(*id).map_err(ExportError::InvalidRequest))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Selection::Ids(ids));
        }

        if !self.domain.is_empty() {
            let domain = Domain::parse(&Value::Array(self.domain.clone()))
                .map_err(|e| ExportError::InvalidRequest(format!("Invalid domain: {e}")))?;
            return Ok(Selection::Filter(domain));
        }

        Err(ExportError::NoSelection)
    }
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Browser URL of the spreadsheet
    pub spreadsheet_url: String,
    /// Title of the worksheet that was overwritten
    pub worksheet_title: String,
    /// Number of data rows written
    pub records_count: usize,
}

impl ExportOutcome {
    /// User-facing success message
    pub fn message(&self) -> String {
        format!(
            "Successfully exported {} records to \"{}\"!",
            self.records_count, self.worksheet_title
        )
    }
}

/// Uniform export response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResponse {
    /// Successful response for an outcome
    pub fn succeeded(outcome: &ExportOutcome) -> Self {
        Self {
            success: true,
            spreadsheet_url: Some(outcome.spreadsheet_url.clone()),
            worksheet_title: Some(outcome.worksheet_title.clone()),
            records_count: Some(outcome.records_count),
            message: Some(outcome.message()),
            error: None,
        }
    }

    /// Failed response carrying the error message
    pub fn failed(error: &dyn std::fmt::Display) -> Self {
        Self {
            success: false,
            spreadsheet_url: None,
            worksheet_title: None,
            records_count: None,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<ExportOutcome, ExportError>> for ExportResponse {
    fn from(result: Result<ExportOutcome, ExportError>) -> Self {
        match result {
            Ok(outcome) => Self::succeeded(&outcome),
            Err(error) => Self::failed(&error),
        }
    }
}

/// Treats JSON `null` and `false` as the type's default
///
/// The web client sends `false` for unset optional arguments.
fn falsy_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null | Value::Bool(false) => Ok(T::default()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_request() {
        let request: ExportRequest = serde_json::from_value(json!({
            "model": "res.partner",
            "fields": ["name", "country_id/name"],
            "field_labels": ["Name", "Country"],
            "ids": [3, 1],
            "domain": [["active", "=", true]],
            "context": {"lang": "fr_FR", "tz": "Europe/Brussels"}
        }))
        .unwrap();

        assert_eq!(request.model_name().unwrap().as_str(), "res.partner");
        assert_eq!(request.field_paths().unwrap().len(), 2);
        assert_eq!(request.labels().unwrap(), &["Name", "Country"]);
        assert_eq!(request.context.get("lang"), Some(&json!("fr_FR")));
    }

    #[test]
    fn test_false_and_null_arguments() {
        let request: ExportRequest = serde_json::from_value(json!({
            "model": "res.partner",
            "fields": ["name"],
            "field_labels": null,
            "ids": false,
            "domain": false,
            "context": null
        }))
        .unwrap();

        assert!(request.ids.is_empty());
        assert!(request.domain.is_empty());
        assert!(request.labels().is_none());
        assert_eq!(request.selection(), Err(ExportError::NoSelection));
    }

    #[test]
    fn test_ids_win_over_domain() {
        let request = ExportRequest::new("res.partner", vec!["name".into()])
            .with_ids(vec![2, 1])
            .with_domain(vec![json!(["active", "=", true])]);

        match request.selection().unwrap() {
            Selection::Ids(ids) => {
                assert_eq!(ids.iter().map(|id| id.get()).collect::<Vec<_>>(), vec![2, 1]);
            }
            other => panic!("expected ids, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_selection() {
        let request = ExportRequest::new("res.partner", vec!["name".into()])
            .with_domain(vec![json!(["active", "=", true])]);
        assert!(matches!(request.selection().unwrap(), Selection::Filter(_)));
    }

    #[test]
    fn test_invalid_inputs() {
        let request = ExportRequest::new("res.partner", vec![]);
        assert!(matches!(
            request.field_paths(),
            Err(ExportError::InvalidRequest(_))
        ));

        let request = ExportRequest::new("Bad Model", vec!["name".into()]);
        assert!(request.model_name().is_err());

        let request = ExportRequest::new("res.partner", vec!["name".into()]).with_ids(vec![0]);
        assert!(matches!(
            request.selection(),
            Err(ExportError::InvalidRequest(_))
        ));

        let request = ExportRequest::new("res.partner", vec!["name".into()])
            .with_domain(vec![json!(["active", "~", true])]);
        let err = request.selection().unwrap_err();
        assert!(err.to_string().contains("Invalid domain"));
    }

    #[test]
    fn test_success_response_shape() {
        let outcome = ExportOutcome {
            spreadsheet_url: "https://docs.google.com/spreadsheets/d/abc".to_string(),
            worksheet_title: "Sheet1".to_string(),
            records_count: 2,
        };
        let value = serde_json::to_value(ExportResponse::succeeded(&outcome)).unwrap();

        assert_eq!(
            value,
            json!({
                "success": true,
                "spreadsheet_url": "https://docs.google.com/spreadsheets/d/abc",
                "worksheet_title": "Sheet1",
                "records_count": 2,
                "message": "Successfully exported 2 records to \"Sheet1\"!"
            })
        );
    }

    #[test]
    fn test_failure_response_shape() {
        let response: ExportResponse = Err(ExportError::NoRecords).into();
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"success": false, "error": "No records to export"})
        );
    }
}
