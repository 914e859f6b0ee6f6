//! HTTP routes
//!
//! `POST /web/export/google_sheets` takes the web client's JSON-RPC 2.0
//! call (`{"jsonrpc": "2.0", "method": "call", "params": {...}, "id": 1}`)
//! and answers with the export response as the call's `result`. A bare
//! request object is accepted as well and answered with a bare response.

use crate::adapters::Adapters;
use crate::config::{ParametersConfig, SecretString};
use crate::core::export::{ExportRequest, ExportResponse};
use crate::domain::errors::ExportError;
use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

/// Route of the export endpoint
pub const EXPORT_ROUTE: &str = "/web/export/google_sheets";

/// Shared state of the HTTP server
#[derive(Clone)]
pub struct AppState {
    adapters: Adapters,
    parameters: ParametersConfig,
    api_token: Option<SecretString>,
}

impl AppState {
    /// Create server state
    pub fn new(
        adapters: Adapters,
        parameters: ParametersConfig,
        api_token: Option<SecretString>,
    ) -> Self {
        Self {
            adapters,
            parameters,
            api_token,
        }
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(ref expected) = self.api_token else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| {
                let expected = expected.expose_secret().as_str().as_bytes();
                bool::from(expected.ct_eq(token.trim().as_bytes()))
            })
    }
}

/// Create router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(EXPORT_ROUTE, post(export_google_sheets))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Export endpoint
async fn export_google_sheets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.is_authorized(&headers) {
        tracing::warn!("Rejected export request with a missing or wrong API token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let call = RpcCall::from_body(body);
    let response = match serde_json::from_value::<ExportRequest>(call.params) {
        Ok(request) => run_export(&state, &request).await,
        Err(e) => ExportResponse::failed(&ExportError::InvalidRequest(e.to_string())),
    };

    let body = match call.id {
        Some(id) => json!({ "jsonrpc": "2.0", "id": id, "result": response }),
        None => json!(response),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn run_export(state: &AppState, request: &ExportRequest) -> ExportResponse {
    match state.adapters.coordinator(&state.parameters).await {
        Ok(coordinator) => coordinator.execute(request).await,
        Err(e) => {
            tracing::error!(error = %e, "Could not read export settings");
            ExportResponse::failed(&e)
        }
    }
}

/// Request body split into call id and parameters
struct RpcCall {
    /// `Some` for JSON-RPC calls (a missing id is answered as `null`)
    id: Option<Value>,
    params: Value,
}

impl RpcCall {
    fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) if map.contains_key("jsonrpc") || map.contains_key("params") => {
                let id = map.remove("id").unwrap_or(Value::Null);
                let params = map.remove("params").unwrap_or_else(|| json!({}));
                Self {
                    id: Some(id),
                    params,
                }
            }
            other => Self {
                id: None,
                params: other,
            },
        }
    }
}
