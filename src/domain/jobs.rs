// Queue-only job descriptors
//
// Jobs carry the minimum identifying data the consumer needs to re-fetch
// authoritative state before acting. Payload fields are never trusted as the
// source of truth for anything mutable.

use serde::{Deserialize, Serialize};

/// Published after a user row is committed; triggers the welcome email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeEmailJob {
    pub user_id: i64,
    pub email: String,
    pub name: String,
}

/// Published after a report row is committed with status `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportJob {
    pub report_id: i64,
}
