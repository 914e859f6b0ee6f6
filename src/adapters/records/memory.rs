//! In-memory record source backed by a JSON dataset
//!
//! Dataset layout:
//!
//! ```json
//! {
//!   "models": {
//!     "res.partner": {
//!       "fields": {
//!         "country_id": {"type": "many2one", "relation": "res.country"},
//!         "create_date": {"type": "datetime"}
//!       },
//!       "records": [
//!         {"id": 1, "name": "Alice", "active": true, "country_id": 2,
//!          "create_date": "2024-01-15 09:30:00"}
//!       ]
//!     },
//!     "res.country": {"records": [{"id": 2, "name": "Belgium"}]}
//!   }
//! }
//! ```
//!
//! Fields without metadata are typed from their JSON value. One2many
//! fields may list ids explicitly or be derived from the inverse column
//! named by `relation_field`.

use super::models::{referenced_ids, scalar_value, FieldKind, FieldSpec};
use super::traits::RecordSource;
use crate::core::selection::FieldSelection;
use crate::domain::errors::SheetsExportError;
use crate::domain::filter::Domain;
use crate::domain::ids::{ModelName, RecordId};
use crate::domain::record::{FieldValue, Record};
use crate::domain::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

type Row = Map<String, Value>;

/// Top-level dataset document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub models: BTreeMap<String, ModelData>,
}

/// Field metadata and rows of one model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub records: Vec<Row>,
}

#[derive(Debug)]
struct MemoryModel {
    fields: BTreeMap<String, FieldSpec>,
    rows: BTreeMap<i64, Row>,
}

impl MemoryModel {
    fn has_active_flag(&self) -> bool {
        self.fields.contains_key("active") || self.rows.values().any(|r| r.contains_key("active"))
    }
}

/// Record source over a dataset held in memory
#[derive(Debug)]
pub struct MemoryRecordSource {
    models: BTreeMap<String, MemoryModel>,
}

impl MemoryRecordSource {
    /// Indexes a dataset by model and id
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid model names and for rows
    /// without a positive, unique `id`.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let mut models = BTreeMap::new();

        for (name, data) in dataset.models {
            ModelName::new(name.as_str()).map_err(SheetsExportError::Validation)?;

            let mut rows = BTreeMap::new();
            for row in data.records {
                let id = row
                    .get("id")
                    .and_then(Value::as_i64)
                    .filter(|id| *id > 0)
                    .ok_or_else(|| {
                        SheetsExportError::Validation(format!(
                            "Every {name} record needs a positive integer id"
                        ))
                    })?;
                if rows.insert(id, row).is_some() {
                    return Err(SheetsExportError::Validation(format!(
                        "Duplicate id {id} in {name}"
                    )));
                }
            }

            models.insert(
                name,
                MemoryModel {
                    fields: data.fields,
                    rows,
                },
            );
        }

        Ok(Self { models })
    }

    /// Parses a dataset from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Self::from_dataset(dataset)
    }

    /// Reads a dataset file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid dataset.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            SheetsExportError::Io(format!("Failed to read dataset {}: {}", path.display(), e))
        })?;
        let source = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            models = source.models.len(),
            "Loaded in-memory dataset"
        );
        Ok(source)
    }

    /// Number of rows stored for a model
    pub fn count(&self, model: &str) -> usize {
        self.models.get(model).map_or(0, |m| m.rows.len())
    }

    fn model(&self, name: &ModelName) -> Result<&MemoryModel> {
        self.models
            .get(name.as_str())
            .ok_or_else(|| SheetsExportError::Validation(format!("Unknown model: {name}")))
    }

    fn materialize(
        &self,
        model_name: &ModelName,
        id: i64,
        selection: &FieldSelection,
    ) -> Result<Option<Record>> {
        let Some(model) = self.models.get(model_name.as_str()) else {
            return Ok(None);
        };
        let Some(row) = model.rows.get(&id) else {
            return Ok(None);
        };

        let record_id = RecordId::new(id).map_err(SheetsExportError::Validation)?;
        let mut record = Record::new(model_name.clone(), record_id);

        for (name, raw) in row {
            if name == "id" {
                continue;
            }
            let spec = model.fields.get(name);
            if spec.is_some_and(|s| s.kind.is_relational()) {
                continue;
            }
            record.insert(name.as_str(), scalar_value(spec.map(|s| s.kind), raw));
        }

        for field in selection.fields() {
            let Some(spec) = model.fields.get(field).filter(|s| s.kind.is_relational()) else {
                continue;
            };
            let target = relation_model(field, spec)?;
            let child = selection.child(field).cloned().unwrap_or_default();

            let mut related = Vec::new();
            for related_id in self.related_ids(spec, &target, row.get(field), id) {
                if let Some(r) = self.materialize(&target, related_id, &child)? {
                    related.push(Arc::new(r));
                }
            }

            let value = if spec.kind.is_collection() {
                FieldValue::References(related)
            } else {
                FieldValue::Reference(related.into_iter().next())
            };
            record.insert(field, value);
        }

        Ok(Some(record))
    }

    fn related_ids(
        &self,
        spec: &FieldSpec,
        target: &ModelName,
        raw: Option<&Value>,
        owner_id: i64,
    ) -> Vec<i64> {
        if let Some(raw) = raw {
            return referenced_ids(spec.kind, raw);
        }

        // Inverse side of a one2many: rows of the target pointing back here
        match (&spec.relation_field, self.models.get(target.as_str())) {
            (Some(inverse), Some(target_model)) if spec.kind == FieldKind::One2many => target_model
                .rows
                .iter()
                .filter(|(_, row)| {
                    row.get(inverse).is_some_and(|v| {
                        referenced_ids(FieldKind::Many2one, v).first() == Some(&owner_id)
                    })
                })
                .map(|(id, _)| *id)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn relation_model(field: &str, spec: &FieldSpec) -> Result<ModelName> {
    let relation = spec.relation.as_deref().ok_or_else(|| {
        SheetsExportError::Validation(format!("Relational field {field} has no relation model"))
    })?;
    ModelName::new(relation).map_err(SheetsExportError::Validation)
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    fn source_name(&self) -> &str {
        "memory"
    }

    async fn browse(
        &self,
        model: &ModelName,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> Result<Vec<Record>> {
        self.model(model)?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.materialize(model, id.get(), selection)? {
                Some(record) => records.push(record),
                None => tracing::warn!(model = %model, id = %id, "Record not found, skipping"),
            }
        }
        Ok(records)
    }

    async fn search(
        &self,
        model: &ModelName,
        domain: &Domain,
        selection: &FieldSelection,
    ) -> Result<Vec<Record>> {
        let memory_model = self.model(model)?;

        // Filtered fields must be loaded for the domain to see them
        let mut selection = selection.clone();
        for field in domain.fields() {
            selection.insert_field(field);
        }

        // Archived rows are hidden unless the filter mentions `active`
        let active_test = !domain.fields().contains(&"active") && memory_model.has_active_flag();

        let mut records = Vec::new();
        for (id, row) in &memory_model.rows {
            if active_test && row.get("active").is_some_and(|v| !v.as_bool().unwrap_or(false)) {
                continue;
            }
            if let Some(record) = self.materialize(model, *id, &selection)? {
                if domain.matches(&record) {
                    records.push(record);
                }
            }
        }

        tracing::debug!(model = %model, matched = records.len(), "Searched in-memory dataset");
        Ok(records)
    }
}
