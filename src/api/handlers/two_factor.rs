use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::api::AppState;
use crate::services::TwoFactorSetup;

/// Request body carrying a TOTP or recovery code
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Recovery codes issued when 2FA turns on; shown exactly once
#[derive(Debug, Serialize)]
pub struct EnableResponse {
    pub recovery_codes: Vec<String>,
}

/// Provision a new 2FA secret for the authenticated user
///
/// POST /api/2fa/setup
pub async fn setup(
    JwtAuth(user_id): JwtAuth,
    State(state): State<AppState>,
) -> Result<Json<TwoFactorSetup>, ApiError> {
    let setup = state.users.setup_two_factor(user_id).await?;
    Ok(Json(setup))
}

/// Enable 2FA after the user proves possession of the secret
///
/// POST /api/2fa/enable
pub async fn enable(
    JwtAuth(user_id): JwtAuth,
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<EnableResponse>, ApiError> {
    let recovery_codes = state.users.enable_two_factor(user_id, &req.code).await?;
    Ok(Json(EnableResponse { recovery_codes }))
}

/// Verify a TOTP or recovery code for the authenticated user
///
/// POST /api/2fa/verify
pub async fn verify(
    JwtAuth(user_id): JwtAuth,
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<Value>, ApiError> {
    state.users.verify_two_factor(user_id, &req.code).await?;
    Ok(Json(json!({ "verified": true })))
}

/// Disable 2FA, clearing the secret and all recovery codes
///
/// POST /api/2fa/disable
pub async fn disable(
    JwtAuth(user_id): JwtAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state.users.disable_two_factor(user_id).await?;
    Ok(Json(json!({ "disabled": true })))
}
