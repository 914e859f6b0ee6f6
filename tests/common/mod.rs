//! Shared test doubles for the spreadsheet service and a sample dataset

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use sheets_export::adapters::records::MemoryRecordSource;
use sheets_export::adapters::sheets::{
    SheetsConnector, SheetsResult, SheetsSession, Spreadsheet, Worksheet,
};
use sheets_export::config::SecretString;
use sheets_export::domain::{SheetsError, SpreadsheetId};
use std::sync::{Arc, Mutex};

/// Step at which the fake spreadsheet service fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    Authorize,
    Open,
    NoWorksheet,
    Clear,
    Update,
    Freeze,
    Resize,
}

/// Everything the fake service was asked to do
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<String>>,
    pub values: Mutex<Vec<Vec<String>>>,
}

impl Recorder {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn values(&self) -> Vec<Vec<String>> {
        self.values.lock().unwrap().clone()
    }
}

fn failure(step: &str) -> SheetsError {
    SheetsError::RequestFailed {
        status: 500,
        message: format!("{step} failed"),
    }
}

/// In-memory stand-in for the Google Sheets service
pub struct FakeSheets {
    pub recorder: Arc<Recorder>,
    fail_at: FailAt,
}

impl FakeSheets {
    pub fn new() -> Self {
        Self::failing_at(FailAt::Nothing)
    }

    pub fn failing_at(fail_at: FailAt) -> Self {
        Self {
            recorder: Arc::new(Recorder::default()),
            fail_at,
        }
    }
}

struct FakeSession(Arc<Recorder>, FailAt);
struct FakeSpreadsheet(Arc<Recorder>, FailAt);
struct FakeWorksheet(Arc<Recorder>, FailAt);

#[async_trait]
impl SheetsConnector for FakeSheets {
    async fn authorize(&self, _credentials: &SecretString) -> SheetsResult<Box<dyn SheetsSession>> {
        self.recorder.record("authorize");
        if self.fail_at == FailAt::Authorize {
            return Err(SheetsError::AuthenticationFailed(
                "invalid_grant: Invalid JWT Signature.".to_string(),
            ));
        }
        Ok(Box::new(FakeSession(self.recorder.clone(), self.fail_at)))
    }
}

#[async_trait]
impl SheetsSession for FakeSession {
    async fn open_by_key(&self, id: &SpreadsheetId) -> SheetsResult<Box<dyn Spreadsheet>> {
        self.0.record(format!("open_by_key {id}"));
        if self.1 == FailAt::Open {
            return Err(SheetsError::NotFound("Requested entity was not found.".to_string()));
        }
        Ok(Box::new(FakeSpreadsheet(self.0.clone(), self.1)))
    }
}

impl Spreadsheet for FakeSpreadsheet {
    fn url(&self) -> &str {
        "https://docs.google.com/spreadsheets/d/sheet-123/edit"
    }

    fn title(&self) -> &str {
        "Partners"
    }

    fn worksheet(&self, index: usize) -> Option<Box<dyn Worksheet>> {
        if self.1 == FailAt::NoWorksheet || index > 0 {
            return None;
        }
        Some(Box::new(FakeWorksheet(self.0.clone(), self.1)))
    }
}

#[async_trait]
impl Worksheet for FakeWorksheet {
    fn title(&self) -> &str {
        "Sheet1"
    }

    async fn clear(&self) -> SheetsResult<()> {
        self.0.record("clear");
        if self.1 == FailAt::Clear {
            return Err(failure("clear"));
        }
        Ok(())
    }

    async fn update(&self, values: &[Vec<String>], start_cell: &str) -> SheetsResult<()> {
        self.0.record(format!("update {start_cell}"));
        if self.1 == FailAt::Update {
            return Err(failure("update"));
        }
        *self.0.values.lock().unwrap() = values.to_vec();
        Ok(())
    }

    async fn freeze(&self, rows: u32) -> SheetsResult<()> {
        self.0.record(format!("freeze {rows}"));
        if self.1 == FailAt::Freeze {
            return Err(failure("freeze"));
        }
        Ok(())
    }

    async fn auto_resize_columns(&self, start: u32, end: u32) -> SheetsResult<()> {
        self.0.record(format!("auto_resize_columns {start} {end}"));
        if self.1 == FailAt::Resize {
            return Err(failure("resize"));
        }
        Ok(())
    }
}

/// Partners with countries, tags and children
pub fn partner_source() -> MemoryRecordSource {
    let dataset = json!({
        "models": {
            "res.country": {
                "fields": {"name": {"type": "char"}, "code": {"type": "char"}},
                "records": [
                    {"id": 1, "name": "Belgium", "code": "BE"},
                    {"id": 2, "name": "France", "code": "FR"}
                ]
            },
            "res.partner.category": {
                "fields": {"name": {"type": "char"}},
                "records": [
                    {"id": 1, "name": "VIP"},
                    {"id": 2, "name": "Supplier"}
                ]
            },
            "res.partner": {
                "fields": {
                    "name": {"type": "char"},
                    "email": {"type": "char"},
                    "active": {"type": "boolean"},
                    "credit_limit": {"type": "float"},
                    "create_date": {"type": "datetime"},
                    "country_id": {"type": "many2one", "relation": "res.country"},
                    "parent_id": {"type": "many2one", "relation": "res.partner"},
                    "category_id": {"type": "many2many", "relation": "res.partner.category"},
                    "child_ids": {"type": "one2many", "relation": "res.partner", "relation_field": "parent_id"}
                },
                "records": [
                    {"id": 1, "name": "Alice", "email": "alice@example.com", "active": true,
                     "credit_limit": 1500.5, "create_date": "2024-03-09 14:05:00",
                     "country_id": 1, "category_id": [1, 2]},
                    {"id": 2, "name": "Bob", "email": false, "active": false,
                     "credit_limit": 0, "parent_id": 1, "country_id": 2, "category_id": [2]},
                    {"id": 3, "name": "Carol", "email": "carol@example.com", "active": true,
                     "parent_id": 1}
                ]
            }
        }
    });
    MemoryRecordSource::from_json(&dataset.to_string()).unwrap()
}
