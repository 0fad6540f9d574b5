use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::auth::jwt::create_token;
use crate::services::{CreateUserRequest, UserResponse};

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// TOTP or recovery code, required only when 2FA is enabled
    pub two_factor_code: Option<String>,
}

/// Response from successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register a new user
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    // Validate password (minimum 8 characters)
    if req.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let user = state.users.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password, plus a 2FA code when enabled
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.users.authenticate(&req.email, &req.password).await?;

    if user.two_factor_enabled {
        let code = req
            .two_factor_code
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized("Two-factor code required"))?;
        state.users.verify_two_factor(user.id, code).await?;
    }

    let token = create_token(user.id, user.email.as_str(), &state.config.jwt_secret)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
