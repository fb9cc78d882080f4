use std::collections::BTreeMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::ApplicationWithCompany;
use crate::models::enums::{ApplicationStatus, Priority};
use crate::models::interview::UpcomingInterview;
use crate::services::interview_service::InterviewService;
use crate::utils::field_mapper::Vocabulary;

const UPCOMING_WINDOW_DAYS: i64 = 7;
const PREVIEW_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub total: i64,
    pub active: i64,
    pub response_rate: f64,
    pub by_status: BTreeMap<String, i64>,
}

/// Folds per-status counts into totals. Every status appears in
/// `by_status`, zero-filled. The response rate is the share of
/// applications that moved past `applied`.
pub fn summarize_statuses(counts: &[(ApplicationStatus, i64)]) -> StatusSummary {
    let mut by_status: BTreeMap<String, i64> = ApplicationStatus::ALL
        .iter()
        .map(|s| (s.storage().to_string(), 0))
        .collect();
    let mut total = 0;
    let mut active = 0;
    let mut still_applied = 0;

    for (status, count) in counts {
        *by_status.entry(status.storage().to_string()).or_insert(0) += count;
        total += count;
        if !status.is_closed() {
            active += count;
        }
        if *status == ApplicationStatus::Applied {
            still_applied += count;
        }
    }

    let response_rate = if total == 0 {
        0.0
    } else {
        let rate = (total - still_applied) as f64 / total as f64;
        (rate * 100.0).round() / 100.0
    };

    StatusSummary {
        total,
        active,
        response_rate,
        by_status,
    }
}

pub struct DashboardStats {
    pub statuses: StatusSummary,
    pub by_priority: BTreeMap<String, i64>,
    pub open_tasks: i64,
    pub upcoming_interviews: Vec<UpcomingInterview>,
    pub recent_applications: Vec<ApplicationWithCompany>,
}

#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
    interviews: InterviewService,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            interviews: InterviewService::new(pool.clone()),
            pool,
        }
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<DashboardStats> {
        let status_counts = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            "SELECT status, COUNT(*) FROM applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let priority_counts = sqlx::query_as::<_, (Priority, i64)>(
            "SELECT priority, COUNT(*) FROM applications WHERE user_id = $1 GROUP BY priority",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut by_priority: BTreeMap<String, i64> = Priority::ALL
            .iter()
            .map(|p| (p.storage().to_string(), 0))
            .collect();
        for (priority, count) in priority_counts {
            by_priority.insert(priority.storage().to_string(), count);
        }

        let open_tasks: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tasks t
            JOIN applications a ON a.id = t.application_id
            WHERE a.user_id = $1 AND t.completed = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let recent_applications = sqlx::query_as::<_, ApplicationWithCompany>(
            r#"
            SELECT a.*, c.name AS company_name
            FROM applications a
            JOIN companies c ON c.id = a.company_id
            WHERE a.user_id = $1
            ORDER BY a.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(PREVIEW_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let upcoming_interviews = self
            .interviews
            .upcoming(user_id, UPCOMING_WINDOW_DAYS, PREVIEW_LIMIT)
            .await?;

        Ok(DashboardStats {
            statuses: summarize_statuses(&status_counts),
            by_priority,
            open_tasks,
            upcoming_interviews,
            recent_applications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_account_has_zero_filled_statuses() {
        let summary = summarize_statuses(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.response_rate, 0.0);
        assert_eq!(summary.by_status.len(), 7);
        assert!(summary.by_status.values().all(|c| *c == 0));
    }

    #[test]
    fn counts_active_and_responded_applications() {
        let summary = summarize_statuses(&[
            (ApplicationStatus::Applied, 2),
            (ApplicationStatus::Interviewed, 1),
            (ApplicationStatus::Rejected, 1),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active, 3);
        assert_eq!(summary.response_rate, 0.5);
        assert_eq!(summary.by_status["interviewed"], 1);
        assert_eq!(summary.by_status["offer"], 0);
    }
}
