//! Google Sheets v4 client
//!
//! HTTP implementation of the spreadsheet capabilities. A connector
//! exchanges service account credentials for a bearer token; the session,
//! spreadsheet and worksheet handles share that token and one
//! `reqwest::Client`.

use super::auth::{exchange_assertion, ServiceAccountKey};
use super::models::{
    auto_resize_request, freeze_rows_request, ApiErrorResponse, SheetProperties,
    SpreadsheetResource, ValueRange,
};
use super::traits::{SheetsConnector, SheetsResult, SheetsSession, Spreadsheet, Worksheet};
use crate::config::{SecretString, SheetsConfig, ValueInputOption};
use crate::domain::errors::SheetsError;
use crate::domain::ids::SpreadsheetId;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fields requested from `spreadsheets.get`
const SPREADSHEET_FIELDS: &str = "spreadsheetId,spreadsheetUrl,properties.title,sheets.properties";

/// Builds the A1 range that anchors a worksheet (`'Sheet 1'!A1`)
///
/// Single quotes inside the title are doubled.
pub fn a1_range(sheet_title: &str, cell: &str) -> String {
    format!("'{}'!{}", sheet_title.replace('\'', "''"), cell)
}

/// Range covering a whole worksheet
fn whole_sheet_range(sheet_title: &str) -> String {
    format!("'{}'", sheet_title.replace('\'', "''"))
}

/// Browser URL for a spreadsheet key
pub fn spreadsheet_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{id}")
}

/// State shared by every handle of one authorized session
struct ApiState {
    http: Client,
    base_url: Url,
    token: SecretString,
    value_input_option: ValueInputOption,
}

impl ApiState {
    /// `{base}/spreadsheets/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> SheetsResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SheetsError::ConnectionFailed(format!("Unusable API base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("spreadsheets")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose_secret().as_str())
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> SheetsResult<Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| SheetsError::ConnectionFailed(format!("{context}: {e}")))?;

        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(status_error(resp, context).await)
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Value>) -> SheetsResult<()> {
        let target = format!("{spreadsheet_id}:batchUpdate");
        let url = self.endpoint(&[target.as_str()])?;
        let request = self
            .request(Method::POST, url)
            .json(&json!({ "requests": requests }));
        self.send(request, "batchUpdate").await?;
        Ok(())
    }
}

/// Maps a non-success response to a [`SheetsError`]
async fn status_error(resp: Response, context: &str) -> SheetsError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => SheetsError::NotFound(format!("{context}: {message}")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SheetsError::AuthenticationFailed(format!("{context}: {message}"))
        }
        _ => SheetsError::RequestFailed {
            status: status.as_u16(),
            message: format!("{context}: {message}"),
        },
    }
}

/// Google Sheets connector backed by the public REST API
pub struct GoogleSheetsConnector {
    http: Client,
    config: SheetsConfig,
}

impl GoogleSheetsConnector {
    /// Creates a connector with the configured timeout
    pub fn new(config: SheetsConfig) -> Result<Self, SheetsError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                SheetsError::ConnectionFailed(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    /// Opens a session with an already issued access token
    pub fn session_with_token(&self, token: SecretString) -> SheetsResult<GoogleSheetsSession> {
        let base_url = Url::parse(&self.config.api_base_url).map_err(|e| {
            SheetsError::ConnectionFailed(format!(
                "Invalid API base URL '{}': {e}",
                self.config.api_base_url
            ))
        })?;

        Ok(GoogleSheetsSession {
            api: Arc::new(ApiState {
                http: self.http.clone(),
                base_url,
                token,
                value_input_option: self.config.value_input_option,
            }),
        })
    }
}

#[async_trait]
impl SheetsConnector for GoogleSheetsConnector {
    async fn authorize(&self, credentials: &SecretString) -> SheetsResult<Box<dyn SheetsSession>> {
        let key = ServiceAccountKey::parse(credentials)?;
        let token_uri = self
            .config
            .token_uri
            .as_deref()
            .unwrap_or_else(|| key.token_uri())
            .to_string();

        let assertion = key.assertion(&token_uri, chrono::Utc::now().timestamp())?;
        tracing::debug!(
            client_email = key.client_email(),
            token_uri = %token_uri,
            "Requesting access token"
        );

        let token = exchange_assertion(&self.http, &token_uri, &assertion).await?;
        Ok(Box::new(self.session_with_token(token)?))
    }
}

/// Authorized session
pub struct GoogleSheetsSession {
    api: Arc<ApiState>,
}

#[async_trait]
impl SheetsSession for GoogleSheetsSession {
    async fn open_by_key(&self, id: &SpreadsheetId) -> SheetsResult<Box<dyn Spreadsheet>> {
        let mut url = self.api.endpoint(&[id.as_str()])?;
        url.query_pairs_mut().append_pair("fields", SPREADSHEET_FIELDS);

        let resp = self
            .api
            .send(self.api.request(Method::GET, url), "spreadsheets.get")
            .await?;
        let resource: SpreadsheetResource = resp.json().await.map_err(|e| {
            SheetsError::InvalidResponse(format!("Malformed spreadsheet resource: {e}"))
        })?;

        let mut sheets: Vec<SheetProperties> =
            resource.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|s| s.index);

        tracing::debug!(
            spreadsheet_id = %resource.spreadsheet_id,
            worksheets = sheets.len(),
            "Opened spreadsheet"
        );

        Ok(Box::new(GoogleSpreadsheet {
            url: resource
                .spreadsheet_url
                .unwrap_or_else(|| spreadsheet_url(&resource.spreadsheet_id)),
            id: resource.spreadsheet_id,
            title: resource.properties.title,
            sheets,
            api: Arc::clone(&self.api),
        }))
    }
}

/// Opened spreadsheet with its worksheet list
pub struct GoogleSpreadsheet {
    id: String,
    url: String,
    title: String,
    sheets: Vec<SheetProperties>,
    api: Arc<ApiState>,
}

impl Spreadsheet for GoogleSpreadsheet {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn worksheet(&self, index: usize) -> Option<Box<dyn Worksheet>> {
        let sheet = self.sheets.get(index)?;
        Some(Box::new(GoogleWorksheet {
            spreadsheet_id: self.id.clone(),
            sheet_id: sheet.sheet_id,
            title: sheet.title.clone(),
            api: Arc::clone(&self.api),
        }))
    }
}

/// One worksheet of an opened spreadsheet
pub struct GoogleWorksheet {
    spreadsheet_id: String,
    sheet_id: i64,
    title: String,
    api: Arc<ApiState>,
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn clear(&self) -> SheetsResult<()> {
        let target = format!("{}:clear", whole_sheet_range(&self.title));
        let url = self
            .api
            .endpoint(&[self.spreadsheet_id.as_str(), "values", target.as_str()])?;

        let request = self.api.request(Method::POST, url).json(&json!({}));
        self.api.send(request, "values.clear").await?;
        Ok(())
    }

    async fn update(&self, values: &[Vec<String>], start_cell: &str) -> SheetsResult<()> {
        let range = a1_range(&self.title, start_cell);
        let mut url = self
            .api
            .endpoint(&[self.spreadsheet_id.as_str(), "values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", self.api.value_input_option.as_str());

        let body = ValueRange {
            range: &range,
            major_dimension: "ROWS",
            values,
        };
        let request = self.api.request(Method::PUT, url).json(&body);
        self.api.send(request, "values.update").await?;

        tracing::debug!(worksheet = %self.title, rows = values.len(), "Wrote values");
        Ok(())
    }

    async fn freeze(&self, rows: u32) -> SheetsResult<()> {
        self.api
            .batch_update(
                &self.spreadsheet_id,
                vec![freeze_rows_request(self.sheet_id, rows)],
            )
            .await
    }

    async fn auto_resize_columns(&self, start: u32, end: u32) -> SheetsResult<()> {
        self.api
            .batch_update(
                &self.spreadsheet_id,
                vec![auto_resize_request(self.sheet_id, start, end)],
            )
            .await
    }
}
