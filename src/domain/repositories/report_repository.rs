use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::report::Report;

/// Repository trait for the Report entity
///
/// Only the unit of work for the current processing transaction may mutate a
/// report; there is no cross-transaction locking beyond the storage engine's
/// isolation level.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Inserts a new `pending` report with the caller's opaque payload.
    async fn create(
        &self,
        report_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Report, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>, RepositoryError>;

    /// Persists status, result, and error from the entity.
    async fn update(&self, report: &Report) -> Result<(), RepositoryError>;
}
