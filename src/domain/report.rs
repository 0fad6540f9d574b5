use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of an asynchronously generated report
///
/// Transitions are monotonic: `pending → processing → {completed, failed}`.
/// Once completed or failed, no further worker mutation occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "processing" => Ok(ReportStatus::Processing),
            "completed" => Ok(ReportStatus::Completed),
            "failed" => Ok(ReportStatus::Failed),
            other => Err(format!("unknown report status: {}", other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid report state transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ReportStatus,
    pub to: ReportStatus,
}

/// Report row: an asynchronous computation record
#[derive(Debug, Clone)]
pub struct Report {
    pub id: i64,
    pub report_type: String,
    pub status: ReportStatus,
    /// Opaque caller-supplied parameters
    pub payload: serde_json::Value,
    /// Serialized computation output, set on completion
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Marks the report as picked up by the worker.
    pub fn begin_processing(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ReportStatus::Pending, ReportStatus::Processing)
    }

    /// Records a successful computation result.
    pub fn complete(&mut self, result: serde_json::Value) -> Result<(), InvalidTransition> {
        self.transition(ReportStatus::Processing, ReportStatus::Completed)?;
        self.result = Some(result);
        self.error = None;
        Ok(())
    }

    /// Records a failed computation. The failure itself is durable state.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(ReportStatus::Processing, ReportStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    fn transition(
        &mut self,
        expected: ReportStatus,
        to: ReportStatus,
    ) -> Result<(), InvalidTransition> {
        if self.status != expected {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending_report() -> Report {
        Report {
            id: 7,
            report_type: "user_summary".to_string(),
            status: ReportStatus::Pending,
            payload: json!({"scope": "all"}),
            result: None,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn happy_path_transitions() {
        let mut report = pending_report();
        report.begin_processing().unwrap();
        assert_eq!(report.status, ReportStatus::Processing);

        report.complete(json!({"total_users": 3})).unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert!(report.error.is_none());
        assert!(report.result.is_some());
    }

    #[test]
    fn failure_records_error_message() {
        let mut report = pending_report();
        report.begin_processing().unwrap();
        report.fail("aggregation query failed").unwrap();

        assert_eq!(report.status, ReportStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("aggregation query failed"));
    }

    #[test]
    fn completing_a_pending_report_is_rejected() {
        let mut report = pending_report();
        let err = report.complete(json!({})).unwrap_err();
        assert_eq!(err.from, ReportStatus::Pending);
        assert_eq!(err.to, ReportStatus::Completed);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut report = pending_report();
        report.begin_processing().unwrap();
        report.complete(json!({})).unwrap();

        assert!(report.fail("late failure").is_err());
        assert!(report.begin_processing().is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Processing,
            ReportStatus::Completed,
            ReportStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ReportStatus>().unwrap(), status);
        }
        assert!("bogus".parse::<ReportStatus>().is_err());
    }
}
