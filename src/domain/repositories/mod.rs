// Repository traits: the seam between domain services and storage
// One concrete Postgres implementation per trait, bound to a transaction

pub mod permission_repository;
pub mod reference_repository;
pub mod report_repository;
pub mod user_repository;

pub use permission_repository::PermissionRepository;
pub use reference_repository::ReferenceRepository;
pub use report_repository::ReportRepository;
pub use user_repository::{NewUser, UserChanges, UserRepository};

use thiserror::Error;

/// Storage-layer errors surfaced to services
///
/// Known conditions get their own variant so services can map them without
/// string matching; anything else passes through unmodified as `Database`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record violates a unique constraint")]
    Duplicate,

    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    #[error("stored row failed domain validation: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db)
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                RepositoryError::Duplicate
            }
            _ => RepositoryError::Database(err),
        }
    }
}
