use std::sync::Arc;

use serde_json::json;

use super::ServiceError;
use crate::domain::jobs::GenerateReportJob;
use crate::domain::report::{Report, ReportStatus};
use crate::domain::repositories::{ReportRepository, UserRepository};
use crate::infrastructure::UnitOfWorkFactory;
use crate::queue::{JobPublisher, APP_EXCHANGE, REPORT_GENERATE_KEY};

/// Report request intake and worker-side processing
pub struct ReportService {
    uow_factory: UnitOfWorkFactory,
    /// Absent in the worker process, which consumes rather than publishes
    publisher: Option<Arc<dyn JobPublisher>>,
}

impl ReportService {
    pub fn new(uow_factory: UnitOfWorkFactory, publisher: Option<Arc<dyn JobPublisher>>) -> Self {
        Self {
            uow_factory,
            publisher,
        }
    }

    /// Records a `pending` report and, strictly after the commit, publishes
    /// the generation job.
    ///
    /// If the publish fails the row stays `pending` and retrievable; there
    /// is no compensating delete. A reaper that re-publishes stale pending
    /// reports can be layered on top without changing this contract.
    pub async fn request_report(
        &self,
        report_type: &str,
        payload: serde_json::Value,
    ) -> Result<Report, ServiceError> {
        if report_type.is_empty() {
            return Err(ServiceError::Validation(
                "report type is required".to_string(),
            ));
        }

        let uow = self.uow_factory.begin().await?;
        let report = match uow.reports().create(report_type, &payload).await {
            Ok(report) => report,
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };
        uow.commit().await?;

        self.publish_generate_job(report.id).await;

        Ok(report)
    }

    /// Read-only status fetch; a missing id is `NotFound`, distinct from
    /// storage failures.
    pub async fn get_report_status(&self, id: i64) -> Result<Report, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.reports().find_by_id(id).await;
        uow.rollback().await;

        match result {
            Ok(Some(report)) => Ok(report),
            Ok(None) => Err(ServiceError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Worker-side processing: `pending → processing` is committed in its
    /// own transaction before the computation starts, so status queries
    /// issued during a long run see `processing`. The outcome (completed
    /// with a result, or failed with a message) is committed afterwards in
    /// a second transaction; a computation failure still ends in a durable
    /// `failed` row rather than a row stuck at `processing`.
    pub async fn process_report(&self, report_id: i64) -> Result<(), ServiceError> {
        // Transaction 1: claim the report.
        let uow = self.uow_factory.begin().await?;
        let reports = uow.reports();

        let mut report = match reports.find_by_id(report_id).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        if report.begin_processing().is_err() {
            // Redelivered or already finalized; with at-least-once delivery
            // this is a duplicate, not an error.
            tracing::info!(
                report_id,
                status = %report.status,
                "report not pending, skipping"
            );
            uow.rollback().await;
            return Ok(());
        }

        if let Err(err) = reports.update(&report).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;

        // Heavy work runs outside any open transaction.
        let outcome = self.compute(&report).await;

        // Transaction 2: record the outcome.
        let uow = self.uow_factory.begin().await?;
        let reports = uow.reports();

        let mut report = match reports.find_by_id(report_id).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        if report.status != ReportStatus::Processing {
            tracing::warn!(report_id, status = %report.status, "report finalized elsewhere");
            uow.rollback().await;
            return Ok(());
        }

        let transition = match outcome {
            Ok(result) => report.complete(result),
            Err(message) => report.fail(message),
        };
        if transition.is_err() {
            uow.rollback().await;
            return Err(ServiceError::Internal);
        }

        if let Err(err) = reports.update(&report).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;

        tracing::info!(report_id, status = %report.status, "report processed");
        Ok(())
    }

    /// Dispatches the computation by report type. An unrecognized type is a
    /// computation failure and ends as a durable `failed` row like any other.
    async fn compute(&self, report: &Report) -> Result<serde_json::Value, String> {
        match report.report_type.as_str() {
            "user_summary" => self.user_summary(report).await,
            other => Err(format!("unsupported report type: {}", other)),
        }
    }

    /// Aggregation over domain data for the user summary report.
    async fn user_summary(&self, report: &Report) -> Result<serde_json::Value, String> {
        let uow = self
            .uow_factory
            .begin()
            .await
            .map_err(|e| e.to_string())?;
        let count = uow.users().count().await;
        uow.rollback().await;

        let total_users = count.map_err(|e| e.to_string())?;
        Ok(json!({
            "report_type": report.report_type,
            "total_users": total_users,
            "generated_at": chrono::Utc::now(),
        }))
    }

    async fn publish_generate_job(&self, report_id: i64) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let job = GenerateReportJob { report_id };
        let body = match serde_json::to_vec(&job) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(report_id, error = %err, "could not serialize report job");
                return;
            }
        };

        match publisher
            .publish(APP_EXCHANGE, REPORT_GENERATE_KEY, &body)
            .await
        {
            Ok(()) => tracing::info!(report_id, "report generation job published"),
            Err(err) => {
                // The pending row outlives the failed publish; see the
                // request_report contract.
                tracing::error!(report_id, error = %err, "could not publish report job")
            }
        }
    }
}
