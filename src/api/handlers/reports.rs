use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::api::AppState;
use crate::domain::permission::Action;
use crate::domain::report::{Report, ReportStatus};

/// Request body for queueing a report
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub report_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// Public view of a report and its lifecycle state
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: i64,
    pub report_type: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Report> for ReportResponse {
    fn from(report: &Report) -> Self {
        ReportResponse {
            id: report.id,
            report_type: report.report_type.clone(),
            status: report.status,
            result: report.result.clone(),
            error: report.error.clone(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Queue a report for asynchronous generation
///
/// POST /api/reports
pub async fn request_report(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportResponse>), ApiError> {
    state
        .permissions
        .require(caller_id, "reports", Action::Add)
        .await?;

    let report = state
        .reports
        .request_report(&req.report_type, req.payload)
        .await?;
    // 202: the row exists but generation happens in the worker.
    Ok((StatusCode::ACCEPTED, Json(ReportResponse::from(&report))))
}

/// Fetch a report and its current status
///
/// GET /api/reports/:id
pub async fn get_report(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReportResponse>, ApiError> {
    state
        .permissions
        .require(caller_id, "reports", Action::Select)
        .await?;

    let report = state.reports.get_report_status(id).await?;
    Ok(Json(ReportResponse::from(&report)))
}
