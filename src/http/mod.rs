//! HTTP surface (§6.1) over the Scan Service (C11): a thin `/api/v1` axum
//! router. Sourced from `aion-web-api`'s `AppState` + handler-module shape
//! (`valknut-rs` itself exposes only a JSON-RPC/MCP server, not a REST API),
//! wired to [`crate::scan::ScanService`] instead of that crate's services.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::core::model::{GateScore, ScanInput, ScanRecord, ScanStatus};
use crate::scan::{ScanLookupError, ScanService};

#[derive(Clone)]
pub struct AppState {
    pub scan_service: Arc<ScanService>,
}

/// Build the `/api/v1` router over `state`, with request tracing via
/// `tower-http`'s `TraceLayer` rather than hand-rolled logging middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .route("/health", get(health))
                .route("/scan", post(submit_scan))
                .route("/scan/:id/status", get(scan_status))
                .route("/reports/:id", get(get_report))
                .route("/reports", get(list_reports)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy"}))
}

#[derive(Debug, Deserialize)]
pub struct ScanOptionsPayload {
    pub threshold: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct JiraOptionsPayload {
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitScanRequest {
    pub repository_url: String,
    pub branch: Option<String>,
    pub github_token: Option<String>,
    pub scan_options: Option<ScanOptionsPayload>,
    #[allow(dead_code)]
    pub jira_options: Option<JiraOptionsPayload>,
}

#[derive(Debug, Serialize)]
pub struct SubmitScanResponse {
    pub scan_id: String,
    pub status: &'static str,
}

async fn submit_scan(
    State(state): State<AppState>,
    Json(request): Json<SubmitScanRequest>,
) -> Result<(StatusCode, Json<SubmitScanResponse>), ApiError> {
    if request.repository_url.trim().is_empty() {
        return Err(ApiError::bad_request("repository_url must not be empty"));
    }

    let input = ScanInput {
        repository_url: request.repository_url,
        branch: request.branch,
        threshold: request.scan_options.and_then(|o| o.threshold),
    };
    let scan_id = state.scan_service.submit(input, request.github_token);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitScanResponse { scan_id, status: "running" }),
    ))
}

#[derive(Debug, Serialize)]
pub struct GateEntry {
    pub name: String,
    pub status: String,
    pub score: f64,
    pub details: Vec<String>,
    pub expected: Option<u32>,
    pub found: Option<u32>,
    pub coverage: Option<f64>,
    pub quality_score: Option<f64>,
}

fn gate_entry(score: &GateScore) -> GateEntry {
    GateEntry {
        name: score.gate.as_str().to_string(),
        status: score.status.to_string(),
        score: score.final_score,
        details: score.details.clone(),
        expected: Some(score.expected),
        found: Some(score.found),
        coverage: Some(score.coverage),
        quality_score: Some(score.quality_score),
    }
}

#[derive(Debug, Serialize)]
pub struct ScanStatusResponse {
    pub scan_id: String,
    pub status: String,
    pub score: Option<f64>,
    pub gates: Vec<GateEntry>,
    pub recommendations: Vec<String>,
    pub report_url: Option<String>,
    pub jira_result: Option<serde_json::Value>,
}

/// Collapse the internal four-state lifecycle to the three external values
/// spec §6.1 documents (`running`, `completed`, `failed`) — `pending` and
/// `running` are indistinguishable to a polling caller.
fn external_status(record: &ScanRecord) -> &'static str {
    match record.status {
        ScanStatus::Pending | ScanStatus::Running => "running",
        ScanStatus::Completed => "completed",
        ScanStatus::Failed => "failed",
    }
}

async fn scan_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScanStatusResponse>, ApiError> {
    let record = state.scan_service.status(&id).map_err(ApiError::from_lookup)?;
    let status = external_status(&record).to_string();

    let (score, gates, recommendations, report_url) = match &record.result {
        Some(result) => (
            Some(result.overall_score),
            result.gate_scores.iter().map(gate_entry).collect(),
            result.recommendations.clone(),
            Some(format!("/api/v1/reports/{id}")),
        ),
        None => (None, Vec::new(), Vec::new(), None),
    };

    Ok(Json(ScanStatusResponse {
        scan_id: id,
        status,
        score,
        gates,
        recommendations,
        report_url,
        jira_result: None,
    }))
}

async fn get_report(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let bytes = state.scan_service.report(&id).await.map_err(ApiError::from_lookup)?;
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], bytes).into_response())
}

#[derive(Debug, Serialize)]
pub struct ReportListEntry {
    pub scan_id: String,
    pub filename: String,
    pub file_size: u64,
    pub created_at: chrono::DateTime<Utc>,
    pub modified_at: chrono::DateTime<Utc>,
    pub score: f64,
    pub status: String,
    pub report_url: String,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportListEntry>,
    pub total_count: usize,
}

async fn list_reports(State(state): State<AppState>) -> Result<Json<ReportListResponse>, ApiError> {
    let metadata = state
        .scan_service
        .list_reports()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let reports: Vec<ReportListEntry> = metadata
        .into_iter()
        .map(|m| ReportListEntry {
            report_url: format!("/api/v1/reports/{}", m.scan_id),
            scan_id: m.scan_id,
            filename: m.filename,
            file_size: m.file_size,
            created_at: m.created_at,
            modified_at: m.modified_at,
            score: m.score,
            status: m.status,
        })
        .collect();

    Ok(Json(ReportListResponse { total_count: reports.len(), reports }))
}

/// Error envelope, spec §6.1: `{error, message, request_id?, timestamp}`.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: &'static str,
    message: String,
    request_id: Option<String>,
    timestamp: chrono::DateTime<Utc>,
}

struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, error: "invalid_request", message: message.into() }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, error: "not_found", message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, error: "internal_error", message: message.into() }
    }

    fn from_lookup(e: ScanLookupError) -> Self {
        match e {
            ScanLookupError::NotFound => Self::not_found("unknown scan id"),
            ScanLookupError::NotReady => Self::bad_request("scan has not completed yet"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorEnvelope {
            error: self.error,
            message: self.message,
            request_id: None,
            timestamp: Utc::now(),
        });
        (self.status, body).into_response()
    }
}
