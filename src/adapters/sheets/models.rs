//! Google OAuth2 and Sheets v4 payloads

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// OAuth2 token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth2 error body (`{"error": "invalid_grant", "error_description": ...}`)
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// `spreadsheets.get` response, restricted by the `fields` mask
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetResource {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
    #[serde(default)]
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadsheetProperties {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetResource {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

/// Body of `values.update`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: &'a [Vec<String>],
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// `updateSheetProperties` request freezing header rows
pub fn freeze_rows_request(sheet_id: i64, rows: u32) -> Value {
    json!({
        "updateSheetProperties": {
            "properties": {
                "sheetId": sheet_id,
                "gridProperties": {"frozenRowCount": rows}
            },
            "fields": "gridProperties.frozenRowCount"
        }
    })
}

/// `autoResizeDimensions` request for a column range (end exclusive)
pub fn auto_resize_request(sheet_id: i64, start: u32, end: u32) -> Value {
    json!({
        "autoResizeDimensions": {
            "dimensions": {
                "sheetId": sheet_id,
                "dimension": "COLUMNS",
                "startIndex": start,
                "endIndex": end
            }
        }
    })
}
