use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dto::application_dto::ApplicationResponse;
use crate::dto::interview_dto::InterviewResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_applications: i64,
    pub active_applications: i64,
    pub response_rate: f64,
    pub by_status: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
    pub open_tasks: i64,
    pub upcoming_interviews: Vec<InterviewResponse>,
    pub recent_applications: Vec<ApplicationResponse>,
}
