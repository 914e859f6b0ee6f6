//! Export grid construction
//!
//! The grid is the rectangle of cell strings written to the worksheet:
//! one header row, then one row per record in input order. Every row has
//! exactly one cell per requested field.

use crate::core::format::{format_value, resolve};
use crate::domain::ids::FieldPath;
use crate::domain::record::Record;

/// Header plus data rows of display strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportGrid {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ExportGrid {
    /// Builds the grid for a list of records
    ///
    /// The header uses `labels` when non-empty, otherwise the raw field
    /// paths (see [`header_row`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use sheets_export::core::export::ExportGrid;
    /// use sheets_export::domain::{FieldPath, FieldValue, ModelName, Record, RecordId};
    ///
    /// let model = ModelName::new("res.partner").unwrap();
    /// let records = vec![
    ///     Record::new(model.clone(), RecordId::new(1).unwrap())
    ///         .with_field("name", FieldValue::text("Alice"))
    ///         .with_field("active", FieldValue::Boolean(true)),
    /// ];
    /// let fields = vec![FieldPath::new("name").unwrap(), FieldPath::new("active").unwrap()];
    ///
    /// let grid = ExportGrid::build(&fields, None, &records);
    /// assert_eq!(grid.to_values(), vec![vec!["name", "active"], vec!["Alice", "Yes"]]);
    /// ```
    pub fn build(fields: &[FieldPath], labels: Option<&[String]>, records: &[Record]) -> Self {
        let header = header_row(fields, labels);
        let rows = records
            .iter()
            .map(|record| build_row(record, fields))
            .collect();

        Self { header, rows }
    }

    /// Header row
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, one per record
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Number of data rows
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows including the header
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Header and data rows as one list of rows
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

/// Header cells for the requested fields
///
/// Labels are used when supplied and non-empty. A label list shorter than
/// the field list is completed with the remaining raw paths; extra labels
/// are dropped, so the header always has one cell per field.
pub fn header_row(fields: &[FieldPath], labels: Option<&[String]>) -> Vec<String> {
    let labels = labels.filter(|l| !l.is_empty()).unwrap_or(&[]);
    if !labels.is_empty() && labels.len() != fields.len() {
        tracing::warn!(
            labels = labels.len(),
            fields = fields.len(),
            "Field label count does not match field count"
        );
    }

    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            labels
                .get(i)
                .cloned()
                .unwrap_or_else(|| field.to_string())
        })
        .collect()
}

/// Cells for one record, one per field path, in order
pub fn build_row(record: &Record, fields: &[FieldPath]) -> Vec<String> {
    fields
        .iter()
        .map(|path| format_value(&resolve(record, path)))
        .collect()
}
