use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::report::{Report, ReportStatus};
use crate::domain::repositories::{ReportRepository, RepositoryError};
use crate::infrastructure::unit_of_work::SharedTx;

const REPORT_COLUMNS: &str =
    "id, report_type, status, payload, result, error, created_at, updated_at";

/// PostgreSQL implementation of ReportRepository, bound to one transaction
pub struct PgReportRepository {
    tx: SharedTx,
}

impl PgReportRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    report_type: String,
    status: String,
    payload: serde_json::Value,
    result: Option<serde_json::Value>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_domain(self) -> Result<Report, RepositoryError> {
        let status: ReportStatus = self.status.parse().map_err(RepositoryError::Corrupt)?;
        Ok(Report {
            id: self.id,
            report_type: self.report_type,
            status,
            payload: self.payload,
            result: self.result,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(
        &self,
        report_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Report, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!(
            "INSERT INTO reports (report_type, status, payload) VALUES ($1, $2, $3) RETURNING {}",
            REPORT_COLUMNS
        );
        let row = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(report_type)
            .bind(ReportStatus::Pending.as_str())
            .bind(payload)
            .fetch_one(&mut **tx)
            .await?;

        row.into_domain()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Report>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        let row = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(ReportRow::into_domain).transpose()
    }

    async fn update(&self, report: &Report) -> Result<(), RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let result = sqlx::query(
            "UPDATE reports SET status = $2, result = $3, error = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(report.id)
        .bind(report.status.as_str())
        .bind(&report.result)
        .bind(&report.error)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
