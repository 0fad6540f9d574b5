use async_trait::async_trait;

use crate::domain::reference::{Country, Language, Unit};
use crate::domain::repositories::{ReferenceRepository, RepositoryError};
use crate::infrastructure::unit_of_work::SharedTx;

/// PostgreSQL implementation of ReferenceRepository, bound to one transaction
pub struct PgReferenceRepository {
    tx: SharedTx,
}

impl PgReferenceRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i64,
    code: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct LanguageRow {
    id: i64,
    code: String,
    name: String,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct UnitRow {
    id: i64,
    code: String,
    name: String,
}

#[async_trait]
impl ReferenceRepository for PgReferenceRepository {
    async fn list_countries(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Country>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let rows = sqlx::query_as::<_, CountryRow>(
            "SELECT id, code, name FROM countries ORDER BY code LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Country {
                id: r.id,
                code: r.code,
                name: r.name,
            })
            .collect())
    }

    async fn list_languages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Language>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let rows = sqlx::query_as::<_, LanguageRow>(
            "SELECT id, code, name, is_active FROM languages ORDER BY code LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Language {
                id: r.id,
                code: r.code,
                name: r.name,
                is_active: r.is_active,
            })
            .collect())
    }

    async fn list_units(&self, limit: i64, offset: i64) -> Result<Vec<Unit>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let rows = sqlx::query_as::<_, UnitRow>(
            "SELECT id, code, name FROM units ORDER BY code LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Unit {
                id: r.id,
                code: r.code,
                name: r.name,
            })
            .collect())
    }
}
