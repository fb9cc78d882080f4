use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::enums::ApplicationStatus;

/// One immutable record of a status transition. `previous_status` is only
/// empty for the entry written when the application was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub application_id: Uuid,
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
