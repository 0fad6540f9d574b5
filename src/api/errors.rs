use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::ServiceError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => Self::not_found("Resource not found"),
            ServiceError::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            ServiceError::EmailExists => Self::conflict("Email already registered"),
            ServiceError::Validation(message) => Self::bad_request(message),
            ServiceError::Forbidden => Self::forbidden("Permission denied"),
            ServiceError::TwoFactorSetupIncomplete => {
                Self::bad_request("Two-factor setup has not been started")
            }
            ServiceError::InvalidTwoFactorCode => Self::bad_request("Invalid two-factor code"),
            // Storage and internal failures are logged server-side; the
            // response body stays generic.
            ServiceError::Repository(inner) => {
                tracing::error!(error = %inner, "repository error");
                Self::internal_server_error("Internal server error")
            }
            ServiceError::Internal => Self::internal_server_error("Internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_expected_statuses() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::EmailExists, StatusCode::CONFLICT),
            (
                ServiceError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (
                ServiceError::TwoFactorSetupIncomplete,
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::InvalidTwoFactorCode, StatusCode::BAD_REQUEST),
            (ServiceError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_never_leak_details() {
        let api_err = ApiError::from(ServiceError::Internal);
        assert_eq!(api_err.message, "Internal server error");
    }
}
