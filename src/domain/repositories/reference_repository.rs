use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::reference::{Country, Language, Unit};

/// Repository trait for read-only reference data
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn list_countries(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Country>, RepositoryError>;

    async fn list_languages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Language>, RepositoryError>;

    async fn list_units(&self, limit: i64, offset: i64) -> Result<Vec<Unit>, RepositoryError>;
}
