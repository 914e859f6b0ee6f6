//! PostgreSQL record source reading the host framework's tables
//!
//! Model metadata comes from `ir_model_fields`; column types come from
//! `information_schema.columns`. Rows are fetched as `to_jsonb(t)` so the
//! same conversion rules apply as for the in-memory dataset. Relations are
//! expanded level by level, one query per selected relation.

use super::models::{referenced_ids, scalar_value, FieldKind, FieldSpec, DEFAULT_LANG};
use super::traits::RecordSource;
use crate::adapters::postgresql::PostgreSQLClient;
use crate::core::selection::FieldSelection;
use crate::domain::errors::SheetsExportError;
use crate::domain::filter::{Condition, Domain, Operator};
use crate::domain::ids::{ModelName, RecordId};
use crate::domain::record::{FieldValue, Record};
use crate::domain::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tokio_postgres::types::ToSql;

type Row = Map<String, Value>;
type RecordsFuture<'a> = Pin<Box<dyn Future<Output = Result<BTreeMap<i64, Record>>> + Send + 'a>>;

const FIELDS_QUERY: &str = "SELECT name, ttype, relation, relation_field, relation_table, column1, column2 \
     FROM ir_model_fields WHERE model = $1";

const COLUMNS_QUERY: &str = "SELECT column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name::text = $1";

/// Field metadata and physical columns of one model
#[derive(Debug, Clone, Default)]
pub struct ModelSchema {
    table: String,
    fields: BTreeMap<String, FieldSpec>,
    columns: BTreeMap<String, String>,
}

impl ModelSchema {
    /// Builds a schema from metadata rows
    pub fn new(
        table: impl Into<String>,
        fields: BTreeMap<String, FieldSpec>,
        columns: BTreeMap<String, String>,
    ) -> Self {
        Self {
            table: table.into(),
            fields,
            columns,
        }
    }

    fn has_active_flag(&self) -> bool {
        self.columns.contains_key("active")
            && self
                .fields
                .get("active")
                .map_or(true, |f| f.kind == FieldKind::Boolean)
    }
}

/// Record source over the host database
pub struct PostgresRecordSource {
    client: Arc<PostgreSQLClient>,
    schemas: RwLock<HashMap<String, Arc<ModelSchema>>>,
}

impl PostgresRecordSource {
    /// Creates a source sharing an existing client
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self {
            client,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Loads (and caches) the schema of a model
    async fn schema(&self, model: &ModelName) -> Result<Arc<ModelSchema>> {
        if let Some(schema) = self.schemas.read().await.get(model.as_str()) {
            return Ok(schema.clone());
        }

        let table = model.table_name();
        let mut fields = BTreeMap::new();
        for row in self.client.query(FIELDS_QUERY, &[&model.as_str()]).await? {
            let name: String = row.try_get(0).map_err(db_error)?;
            let ttype: String = row.try_get(1).map_err(db_error)?;
            fields.insert(
                name,
                FieldSpec {
                    kind: FieldKind::from_ttype(&ttype),
                    relation: row.try_get(2).map_err(db_error)?,
                    relation_field: row.try_get(3).map_err(db_error)?,
                    relation_table: row.try_get(4).map_err(db_error)?,
                    column1: row.try_get(5).map_err(db_error)?,
                    column2: row.try_get(6).map_err(db_error)?,
                },
            );
        }

        let mut columns = BTreeMap::new();
        for row in self.client.query(COLUMNS_QUERY, &[&table]).await? {
            let name: String = row.try_get(0).map_err(db_error)?;
            let data_type: String = row.try_get(1).map_err(db_error)?;
            columns.insert(name, data_type);
        }

        if columns.is_empty() {
            return Err(SheetsExportError::Validation(format!(
                "Unknown model: {model} (no table {table})"
            )));
        }

        tracing::debug!(
            model = %model,
            fields = fields.len(),
            columns = columns.len(),
            "Loaded model schema"
        );

        let schema = Arc::new(ModelSchema::new(table, fields, columns));
        self.schemas
            .write()
            .await
            .insert(model.as_str().to_string(), schema.clone());
        Ok(schema)
    }

    async fn fetch_rows(&self, schema: &ModelSchema, ids: &[i64]) -> Result<BTreeMap<i64, Row>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.id = ANY($1)",
            quote_ident(&schema.table)?
        );
        let ids = ids.to_vec();

        let mut rows = BTreeMap::new();
        for row in self.client.query(&sql, &[&ids]).await? {
            let value: Value = row.try_get(0).map_err(db_error)?;
            if let Value::Object(map) = value {
                if let Some(id) = map.get("id").and_then(Value::as_i64) {
                    rows.insert(id, map);
                }
            }
        }
        Ok(rows)
    }

    /// Owner id -> related ids for one relational field
    async fn relation_links(
        &self,
        field: &str,
        spec: &FieldSpec,
        target: &ModelName,
        rows: &BTreeMap<i64, Row>,
    ) -> Result<BTreeMap<i64, Vec<i64>>> {
        let owners: Vec<i64> = rows.keys().copied().collect();

        match spec.kind {
            FieldKind::Many2one => Ok(rows
                .iter()
                .map(|(id, row)| {
                    let ids = row
                        .get(field)
                        .map(|raw| referenced_ids(FieldKind::Many2one, raw))
                        .unwrap_or_default();
                    (*id, ids)
                })
                .collect()),
            FieldKind::One2many => {
                let inverse = spec.relation_field.as_deref().ok_or_else(|| {
                    SheetsExportError::Validation(format!("One2many field {field} has no inverse field"))
                })?;
                let sql = format!(
                    "SELECT t.id::bigint, t.{inverse}::bigint FROM {table} t WHERE t.{inverse} = ANY($1) ORDER BY t.id",
                    inverse = quote_ident(inverse)?,
                    table = quote_ident(&target.table_name())?,
                );
                self.collect_links(&sql, &owners).await
            }
            FieldKind::Many2many => {
                let (Some(table), Some(column1), Some(column2)) =
                    (&spec.relation_table, &spec.column1, &spec.column2)
                else {
                    return Err(SheetsExportError::Validation(format!(
                        "Many2many field {field} has no relation table"
                    )));
                };
                let sql = format!(
                    "SELECT r.{c2}::bigint, r.{c1}::bigint FROM {table} r WHERE r.{c1} = ANY($1) ORDER BY r.{c2}",
                    c1 = quote_ident(column1)?,
                    c2 = quote_ident(column2)?,
                    table = quote_ident(table)?,
                );
                self.collect_links(&sql, &owners).await
            }
            _ => Ok(BTreeMap::new()),
        }
    }

    /// Groups `(related_id, owner_id)` rows by owner
    async fn collect_links(&self, sql: &str, owners: &[i64]) -> Result<BTreeMap<i64, Vec<i64>>> {
        let owners = owners.to_vec();
        let mut links: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for row in self.client.query(sql, &[&owners]).await? {
            let related: i64 = row.try_get(0).map_err(db_error)?;
            let owner: i64 = row.try_get(1).map_err(db_error)?;
            links.entry(owner).or_default().push(related);
        }
        Ok(links)
    }

    /// Materializes records with the relations named by `selection`
    fn load_records<'a>(
        &'a self,
        model: &'a ModelName,
        ids: &'a [i64],
        selection: &'a FieldSelection,
    ) -> RecordsFuture<'a> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(BTreeMap::new());
            }

            let schema = self.schema(model).await?;
            let rows = self.fetch_rows(&schema, ids).await?;

            let mut records = BTreeMap::new();
            for (id, row) in &rows {
                let record_id = RecordId::new(*id).map_err(SheetsExportError::Validation)?;
                let mut record = Record::new(model.clone(), record_id);
                for (name, raw) in row {
                    let spec = schema.fields.get(name);
                    if name == "id" || spec.is_some_and(|s| s.kind.is_relational()) {
                        continue;
                    }
                    record.insert(name.as_str(), scalar_value(spec.map(|s| s.kind), raw));
                }
                records.insert(*id, record);
            }

            for field in selection.fields() {
                let Some(spec) = schema.fields.get(field).filter(|s| s.kind.is_relational()) else {
                    continue;
                };
                let relation = spec.relation.as_deref().ok_or_else(|| {
                    SheetsExportError::Validation(format!("Relational field {field} has no relation model"))
                })?;
                let target = ModelName::new(relation).map_err(SheetsExportError::Validation)?;

                let links = self.relation_links(field, spec, &target, &rows).await?;
                let mut target_ids: Vec<i64> = links.values().flatten().copied().collect();
                target_ids.sort_unstable();
                target_ids.dedup();

                let child = selection.child(field).cloned().unwrap_or_default();
                let related: BTreeMap<i64, Arc<Record>> = self
                    .load_records(&target, &target_ids, &child)
                    .await?
                    .into_iter()
                    .map(|(id, record)| (id, Arc::new(record)))
                    .collect();

                for (id, record) in records.iter_mut() {
                    let linked: Vec<Arc<Record>> = links
                        .get(id)
                        .into_iter()
                        .flatten()
                        .filter_map(|related_id| related.get(related_id).cloned())
                        .collect();
                    let value = if spec.kind.is_collection() {
                        FieldValue::References(linked)
                    } else {
                        FieldValue::Reference(linked.into_iter().next())
                    };
                    record.insert(field, value);
                }
            }

            Ok(records)
        })
    }
}

#[async_trait]
impl RecordSource for PostgresRecordSource {
    fn source_name(&self) -> &str {
        "postgresql"
    }

    async fn browse(
        &self,
        model: &ModelName,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> Result<Vec<Record>> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let loaded = self.load_records(model, &raw_ids, selection).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &raw_ids {
            match loaded.get(id) {
                Some(record) => records.push(record.clone()),
                None => tracing::warn!(model = %model, id = id, "Record not found, skipping"),
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
        let schema = self.schema(model).await?;
        let (where_clause, params) = where_clause(&schema, domain)?;
        let sql = format!(
            "SELECT t.id::bigint FROM {} t WHERE {} ORDER BY t.id",
            quote_ident(&schema.table)?,
            where_clause
        );

        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let mut ids = Vec::new();
        for row in self.client.query(&sql, &param_refs).await? {
            ids.push(row.try_get::<_, i64>(0).map_err(db_error)?);
        }

        tracing::debug!(model = %model, matched = ids.len(), "Searched host database");

        let mut loaded = self.load_records(model, &ids, selection).await?;
        Ok(ids.iter().filter_map(|id| loaded.remove(id)).collect())
    }
}

fn db_error(err: tokio_postgres::Error) -> SheetsExportError {
    SheetsExportError::Database(format!("Unexpected column value: {err}"))
}

/// Double-quotes an identifier after checking it is a plain name
pub fn quote_ident(name: &str) -> Result<String> {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name));

    if !valid {
        return Err(SheetsExportError::Validation(format!(
            "Invalid SQL identifier: {name}"
        )));
    }
    Ok(format!("\"{name}\""))
}

/// Translates a domain into a `WHERE` clause with text parameters
///
/// Archived rows are excluded unless the domain filters on `active`.
pub fn where_clause(schema: &ModelSchema, domain: &Domain) -> Result<(String, Vec<String>)> {
    let mut builder = WhereBuilder {
        schema,
        params: Vec::new(),
    };
    let mut sql = builder.expression(domain)?;

    if schema.has_active_flag() && !domain.fields().contains(&"active") {
        sql = if domain.is_all() {
            "t.\"active\" IS TRUE".to_string()
        } else {
            format!("({sql}) AND t.\"active\" IS TRUE")
        };
    }

    Ok((sql, builder.params))
}

struct WhereBuilder<'a> {
    schema: &'a ModelSchema,
    params: Vec<String>,
}

impl WhereBuilder<'_> {
    fn expression(&mut self, domain: &Domain) -> Result<String> {
        Ok(match domain {
            Domain::All => "TRUE".to_string(),
            Domain::Condition(condition) => self.condition(condition)?,
            Domain::And(l, r) => format!("({} AND {})", self.expression(l)?, self.expression(r)?),
            Domain::Or(l, r) => format!("({} OR {})", self.expression(l)?, self.expression(r)?),
            Domain::Not(inner) => format!("(NOT {})", self.expression(inner)?),
        })
    }

    fn param(&mut self, value: String, sql_type: &str) -> String {
        self.params.push(value);
        format!("CAST(${}::text AS {})", self.params.len(), sql_type)
    }

    fn column(&self, field: &str) -> Result<(String, FieldKind)> {
        let kind = match self.schema.fields.get(field) {
            Some(spec) => spec.kind,
            None if field == "id" => FieldKind::Integer,
            None => {
                return Err(SheetsExportError::Validation(format!(
                    "Cannot filter on unknown field: {field}"
                )))
            }
        };
        if kind.is_collection() {
            return Err(SheetsExportError::Validation(format!(
                "Cannot filter on collection field: {field}"
            )));
        }

        let data_type = self.schema.columns.get(field).ok_or_else(|| {
            SheetsExportError::Validation(format!("Cannot filter on non-stored field: {field}"))
        })?;

        let column = format!("t.{}", quote_ident(field)?);
        let expr = if data_type == "jsonb" && is_text_kind(kind) {
            format!("({column}->>'{DEFAULT_LANG}')")
        } else {
            column
        };
        Ok((expr, kind))
    }

    fn condition(&mut self, condition: &Condition) -> Result<String> {
        let (column, kind) = self.column(&condition.field)?;
        let sql_type = sql_type(kind);
        let value = &condition.value;

        let unset = value.is_null()
            || (value == &Value::Bool(false) && kind != FieldKind::Boolean);
        let sql = match condition.operator {
            Operator::Eq if unset => format!("{column} IS NULL"),
            Operator::Ne if unset => format!("{column} IS NOT NULL"),
            Operator::Eq if kind == FieldKind::Boolean && value == &Value::Bool(false) => {
                format!("({column} IS NULL OR {column} = FALSE)")
            }
            Operator::Ne if kind == FieldKind::Boolean && value == &Value::Bool(false) => {
                format!("{column} = TRUE")
            }
            Operator::Eq => {
                let p = self.param(param_text(value, &condition.field)?, sql_type);
                format!("{column} = {p}")
            }
            Operator::Ne => {
                let p = self.param(param_text(value, &condition.field)?, sql_type);
                format!("({column} IS NULL OR {column} <> {p})")
            }
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                let p = self.param(param_text(value, &condition.field)?, sql_type);
                format!("{column} {} {p}", condition.operator)
            }
            Operator::In | Operator::NotIn => {
                let items = value.as_array().cloned().unwrap_or_default();
                let with_null = items.iter().any(|v| matches!(v, Value::Null | Value::Bool(false)))
                    && kind != FieldKind::Boolean;
                let mut placeholders = Vec::new();
                for item in items.iter().filter(|v| !v.is_null()) {
                    if with_null && item == &Value::Bool(false) {
                        continue;
                    }
                    let text = param_text(item, &condition.field)?;
                    placeholders.push(self.param(text, sql_type));
                }

                let mut parts = Vec::new();
                if !placeholders.is_empty() {
                    parts.push(format!("{column} IN ({})", placeholders.join(", ")));
                }
                if with_null {
                    parts.push(format!("{column} IS NULL"));
                }
                let positive = if parts.is_empty() {
                    "FALSE".to_string()
                } else {
                    format!("({})", parts.join(" OR "))
                };

                if condition.operator == Operator::In {
                    positive
                } else if with_null {
                    format!("(NOT {positive})")
                } else {
                    format!("({column} IS NULL OR NOT {positive})")
                }
            }
            Operator::Like | Operator::ILike | Operator::EqLike | Operator::EqILike => {
                self.like(&column, condition, false)?
            }
            Operator::NotLike | Operator::NotILike => self.like(&column, condition, true)?,
        };
        Ok(sql)
    }

    fn like(&mut self, column: &str, condition: &Condition, negate: bool) -> Result<String> {
        let operand = param_text(&condition.value, &condition.field)?;
        let wrap = !matches!(condition.operator, Operator::EqLike | Operator::EqILike);
        let pattern = if wrap { format!("%{operand}%") } else { operand };
        let keyword = match condition.operator {
            Operator::ILike | Operator::NotILike | Operator::EqILike => "ILIKE",
            _ => "LIKE",
        };

        let p = self.param(pattern, "text");
        Ok(if negate {
            format!("({column} IS NULL OR NOT ({column}::text {keyword} {p}))")
        } else {
            format!("{column}::text {keyword} {p}")
        })
    }
}

fn is_text_kind(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::Char | FieldKind::Text | FieldKind::Html | FieldKind::Selection
    )
}

fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Boolean => "boolean",
        FieldKind::Integer | FieldKind::Many2one => "bigint",
        FieldKind::Float | FieldKind::Monetary => "double precision",
        FieldKind::Date => "date",
        FieldKind::Datetime => "timestamp",
        _ => "text",
    }
}

fn param_text(value: &Value, field: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(SheetsExportError::Validation(format!(
            "Unsupported filter value for {field}: {other}"
        ))),
    }
}
