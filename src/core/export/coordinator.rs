//! Export coordinator - orchestrates one spreadsheet export
//!
//! Resolves the records a request selects, renders them into an
//! [`ExportGrid`], and writes that grid to the first worksheet of the
//! configured spreadsheet. Every failure is classified into an
//! [`ExportError`] at the step where it happened; [`ExportCoordinator::execute`]
//! folds the result into the response the web client expects.

use crate::adapters::params::ParameterStore;
use crate::adapters::records::RecordSource;
use crate::adapters::sheets::SheetsConnector;
use crate::config::SecretString;
use crate::core::export::grid::ExportGrid;
use crate::core::export::request::{ExportOutcome, ExportRequest, ExportResponse, Selection};
use crate::core::selection::FieldSelection;
use crate::domain::errors::ExportError;
use crate::domain::ids::{ModelName, SpreadsheetId};
use crate::domain::record::Record;
use crate::domain::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Instant;

/// Cell the grid is written from
const START_CELL: &str = "A1";

/// Number of header rows kept visible while scrolling
const FROZEN_ROWS: u32 = 1;

/// Export settings read from the parameter store
#[derive(Debug, Clone, Default)]
pub struct ExportSettings {
    /// Target spreadsheet key
    pub spreadsheet_id: Option<String>,
    /// Service account key JSON
    pub credentials: Option<SecretString>,
}

impl ExportSettings {
    /// Reads both settings from a parameter store
    ///
    /// Blank values count as not configured.
    pub async fn load(
        store: &dyn ParameterStore,
        credentials_key: &str,
        spreadsheet_id_key: &str,
    ) -> Result<Self> {
        let credentials = store
            .get_param(credentials_key)
            .await?
            .filter(|secret| !secret.expose_secret().is_blank());

        let spreadsheet_id = store
            .get_param(spreadsheet_id_key)
            .await?
            .map(|secret| secret.expose_secret().as_str().trim().to_string())
            .filter(|id| !id.is_empty());

        tracing::debug!(
            credentials_configured = credentials.is_some(),
            spreadsheet_configured = spreadsheet_id.is_some(),
            "Loaded export settings"
        );

        Ok(Self {
            spreadsheet_id,
            credentials,
        })
    }
}

/// Export coordinator
pub struct ExportCoordinator {
    settings: ExportSettings,
    records: Arc<dyn RecordSource>,
    sheets: Arc<dyn SheetsConnector>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        settings: ExportSettings,
        records: Arc<dyn RecordSource>,
        sheets: Arc<dyn SheetsConnector>,
    ) -> Self {
        Self {
            settings,
            records,
            sheets,
        }
    }

    /// Execute an export and report the outcome as a response
    ///
    /// Never fails: errors become `{success: false, error: ...}`.
    pub async fn execute(&self, request: &ExportRequest) -> ExportResponse {
        let start_time = Instant::now();

        match self.try_execute(request).await {
            Ok(outcome) => {
                crate::log_export_complete!(outcome.records_count, start_time.elapsed());
                ExportResponse::succeeded(&outcome)
            }
            Err(e) => {
                let context = format!("Export of {} failed", request.model);
                crate::log_error_with_context!(&e, context.as_str());
                ExportResponse::failed(&e)
            }
        }
    }

    /// Execute an export
    ///
    /// The steps run in this order, each failing with its own error:
    /// 1. Resolve the spreadsheet id
    /// 2. Validate the model and fields, then resolve the selection
    /// 3. Load the records and build the grid
    /// 4. Authenticate and open the spreadsheet's first worksheet
    /// 5. Clear it, write the grid and freeze the header row
    /// 6. Fit the column widths (best effort)
    pub async fn try_execute(
        &self,
        request: &ExportRequest,
    ) -> std::result::Result<ExportOutcome, ExportError> {
        let spreadsheet_id = match self.settings.spreadsheet_id.as_deref() {
            None => return Err(ExportError::MissingSpreadsheetId),
            Some(id) => SpreadsheetId::new(id).map_err(ExportError::InvalidRequest)?,
        };

        let model = request.model_name()?;
        let fields = request.field_paths()?;
        let selection = request.selection()?;

        crate::log_export_start!(model, fields.len());

        let records = self
            .load_records(&model, &selection, &FieldSelection::from_paths(&fields))
            .await?;
        if records.is_empty() {
            return Err(ExportError::NoRecords);
        }

        let grid = ExportGrid::build(&fields, request.labels(), &records);
        tracing::info!(
            rows = grid.row_count(),
            columns = grid.width(),
            "Built export grid"
        );

        let credentials = self
            .settings
            .credentials
            .as_ref()
            .ok_or(ExportError::MissingCredentials)?;

        let session = self
            .sheets
            .authorize(credentials)
            .await
            .map_err(|e| ExportError::AuthenticationFailure(e.to_string()))?;
        tracing::info!("Authenticated with Google");

        let spreadsheet = session
            .open_by_key(&spreadsheet_id)
            .await
            .map_err(|e| ExportError::SpreadsheetUnavailable(e.to_string()))?;
        let worksheet = spreadsheet
            .worksheet(0)
            .ok_or(ExportError::WorksheetUnavailable)?;
        tracing::info!(
            spreadsheet = %spreadsheet.title(),
            worksheet = %worksheet.title(),
            "Opened worksheet"
        );

        worksheet
            .clear()
            .await
            .map_err(|e| ExportError::WriteFailure(e.to_string()))?;
        worksheet
            .update(&grid.to_values(), START_CELL)
            .await
            .map_err(|e| ExportError::WriteFailure(e.to_string()))?;
        worksheet
            .freeze(FROZEN_ROWS)
            .await
            .map_err(|e| ExportError::WriteFailure(e.to_string()))?;
        tracing::info!(rows = grid.row_count(), "Wrote worksheet");

        let width = u32::try_from(grid.width()).unwrap_or(u32::MAX);
        if let Err(e) = worksheet.auto_resize_columns(0, width).await {
            tracing::warn!(error = %e, "Could not auto-resize columns");
        }

        Ok(ExportOutcome {
            spreadsheet_url: spreadsheet.url().to_string(),
            worksheet_title: worksheet.title().to_string(),
            records_count: grid.record_count(),
        })
    }

    async fn load_records(
        &self,
        model: &ModelName,
        selection: &Selection,
        fields: &FieldSelection,
    ) -> std::result::Result<Vec<Record>, ExportError> {
        let records = match selection {
            Selection::Ids(ids) => {
                let records = self
                    .records
                    .browse(model, ids, fields)
                    .await
                    .map_err(|e| ExportError::DataAccess(e.to_string()))?;
                if records.len() < ids.len() {
                    tracing::warn!(
                        requested = ids.len(),
                        found = records.len(),
                        "Some requested records do not exist"
                    );
                }
                records
            }
            Selection::Filter(domain) => self
                .records
                .search(model, domain, fields)
                .await
                .map_err(|e| ExportError::DataAccess(e.to_string()))?,
        };

        tracing::info!(
            source = self.records.source_name(),
            model = %model,
            count = records.len(),
            "Loaded records"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::params::StaticParameterStore;
    use crate::adapters::records::MemoryRecordSource;
    use crate::adapters::sheets::{SheetsResult, SheetsSession, Spreadsheet, Worksheet};
    use crate::config::secret_string;
    use crate::domain::errors::SheetsError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        log: Mutex<Vec<String>>,
        written: Mutex<Vec<Vec<String>>>,
    }

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.log.lock().unwrap().push(call.into());
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    struct FakeConnector {
        calls: Arc<Calls>,
        fail_resize: bool,
    }

    struct FakeSession(Arc<Calls>, bool);
    struct FakeSpreadsheet(Arc<Calls>, bool);
    struct FakeWorksheet(Arc<Calls>, bool);

    #[async_trait]
    impl SheetsConnector for FakeConnector {
        async fn authorize(&self, _: &SecretString) -> SheetsResult<Box<dyn SheetsSession>> {
            self.calls.push("authorize");
            Ok(Box::new(FakeSession(self.calls.clone(), self.fail_resize)))
        }
    }

    #[async_trait]
    impl SheetsSession for FakeSession {
        async fn open_by_key(&self, id: &SpreadsheetId) -> SheetsResult<Box<dyn Spreadsheet>> {
            self.0.push(format!("open {id}"));
            Ok(Box::new(FakeSpreadsheet(self.0.clone(), self.1)))
        }
    }

    impl Spreadsheet for FakeSpreadsheet {
        fn url(&self) -> &str {
            "https://docs.google.com/spreadsheets/d/sheet-1"
        }

        fn title(&self) -> &str {
            "Exports"
        }

        fn worksheet(&self, index: usize) -> Option<Box<dyn Worksheet>> {
            (index == 0).then(|| Box::new(FakeWorksheet(self.0.clone(), self.1)) as Box<dyn Worksheet>)
        }
    }

    #[async_trait]
    impl Worksheet for FakeWorksheet {
        fn title(&self) -> &str {
            "Sheet1"
        }

        async fn clear(&self) -> SheetsResult<()> {
            self.0.push("clear");
            Ok(())
        }

        async fn update(&self, values: &[Vec<String>], start_cell: &str) -> SheetsResult<()> {
            self.0.push(format!("update {start_cell}"));
            *self.0.written.lock().unwrap() = values.to_vec();
            Ok(())
        }

        async fn freeze(&self, rows: u32) -> SheetsResult<()> {
            self.0.push(format!("freeze {rows}"));
            Ok(())
        }

        async fn auto_resize_columns(&self, start: u32, end: u32) -> SheetsResult<()> {
            self.0.push(format!("resize {start}..{end}"));
            if self.1 {
                return Err(SheetsError::RequestFailed {
                    status: 500,
                    message: "resize".to_string(),
                });
            }
            Ok(())
        }
    }

    fn records() -> Arc<dyn RecordSource> {
        let dataset = json!({
            "models": {
                "res.partner": {
                    "fields": {"name": {"type": "char"}, "active": {"type": "boolean"}},
                    "records": [
                        {"id": 1, "name": "Alice", "active": true},
                        {"id": 2, "name": "Bob", "active": false}
                    ]
                }
            }
        });
        Arc::new(MemoryRecordSource::from_json(&dataset.to_string()).unwrap())
    }

    fn settings() -> ExportSettings {
        ExportSettings {
            spreadsheet_id: Some("sheet-1".to_string()),
            credentials: Some(secret_string("{}".to_string())),
        }
    }

    fn coordinator(settings: ExportSettings, fail_resize: bool) -> (ExportCoordinator, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let connector = FakeConnector {
            calls: calls.clone(),
            fail_resize,
        };
        (
            ExportCoordinator::new(settings, records(), Arc::new(connector)),
            calls,
        )
    }

    fn request() -> ExportRequest {
        ExportRequest::new("res.partner", vec!["name".to_string(), "active".to_string()])
            .with_labels(vec!["Name".to_string(), "Active".to_string()])
            .with_ids(vec![1, 2])
    }

    #[tokio::test]
    async fn test_export_writes_grid_in_order() {
        let (coordinator, calls) = coordinator(settings(), false);

        let outcome = coordinator.try_execute(&request()).await.unwrap();

        assert_eq!(outcome.records_count, 2);
        assert_eq!(outcome.worksheet_title, "Sheet1");
        assert_eq!(
            calls.log(),
            vec![
                "authorize",
                "open sheet-1",
                "clear",
                "update A1",
                "freeze 1",
                "resize 0..2"
            ]
        );
        assert_eq!(
            *calls.written.lock().unwrap(),
            vec![
                vec!["Name".to_string(), "Active".to_string()],
                vec!["Alice".to_string(), "Yes".to_string()],
                vec!["Bob".to_string(), "No".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_resize_failure_is_ignored() {
        let (coordinator, _) = coordinator(settings(), true);
        let response = coordinator.execute(&request()).await;
        assert!(response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("Successfully exported 2 records to \"Sheet1\"!")
        );
    }

    #[tokio::test]
    async fn test_missing_spreadsheet_id_checked_first() {
        let settings = ExportSettings {
            spreadsheet_id: None,
            credentials: None,
        };
        let (coordinator, calls) = coordinator(settings, false);

        let err = coordinator
            .try_execute(&ExportRequest::new("res.partner", vec![]))
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::MissingSpreadsheetId);
        assert!(calls.log().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_after_records() {
        let settings = ExportSettings {
            credentials: None,
            ..settings()
        };
        let (coordinator, calls) = coordinator(settings, false);

        let err = coordinator.try_execute(&request()).await.unwrap_err();
        assert_eq!(err, ExportError::MissingCredentials);
        assert!(calls.log().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_yield_no_records() {
        let (coordinator, _) = coordinator(settings(), false);
        let request = ExportRequest::new("res.partner", vec!["name".to_string()])
            .with_ids(vec![99]);

        let err = coordinator.try_execute(&request).await.unwrap_err();
        assert_eq!(err, ExportError::NoRecords);
    }

    #[tokio::test]
    async fn test_unknown_model_is_data_access_error() {
        let (coordinator, _) = coordinator(settings(), false);
        let request = ExportRequest::new("sale.order", vec!["name".to_string()]).with_ids(vec![1]);

        let err = coordinator.try_execute(&request).await.unwrap_err();
        assert!(matches!(err, ExportError::DataAccess(_)));
    }

    #[tokio::test]
    async fn test_settings_load_treats_blank_as_missing() {
        let store = StaticParameterStore::default()
            .with_param("google_sheets.credentials_json", "   ")
            .with_param("google_sheets.spreadsheet_id", " abc ");

        let settings = ExportSettings::load(
            &store,
            "google_sheets.credentials_json",
            "google_sheets.spreadsheet_id",
        )
        .await
        .unwrap();

        assert!(settings.credentials.is_none());
        assert_eq!(settings.spreadsheet_id.as_deref(), Some("abc"));
    }
}
