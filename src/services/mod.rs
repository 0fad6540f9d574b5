// Domain services: orchestrate repositories inside a unit of work and,
// for users and reports, publish follow-up jobs after a successful commit

pub mod permission_service;
pub mod reference_service;
pub mod report_service;
pub mod user_service;

pub use permission_service::PermissionService;
pub use reference_service::ReferenceService;
pub use report_service::ReportService;
pub use user_service::{CreateUserRequest, TwoFactorSetup, UpdateUserRequest, UserResponse, UserService};

use thiserror::Error;

use crate::domain::repositories::RepositoryError;

/// Application error taxonomy surfaced by services
///
/// Known storage conditions are mapped here; anything else passes through as
/// `Repository` and renders as an internal server error at the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("record not found")]
    NotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email address already in use")]
    EmailExists,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("permission denied")]
    Forbidden,

    #[error("two-factor setup has not been completed")]
    TwoFactorSetupIncomplete,

    #[error("invalid two-factor code")]
    InvalidTwoFactorCode,

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("internal server error")]
    Internal,
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            // The only unique constraint reachable from the write path is
            // users.email, so a duplicate maps to the email conflict.
            RepositoryError::Duplicate => ServiceError::EmailExists,
            other => ServiceError::Repository(other),
        }
    }
}
