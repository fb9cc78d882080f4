use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::{
        application_dto::ApplicationResponse, dashboard_dto::DashboardStatsResponse,
        interview_dto::InterviewResponse,
    },
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Pipeline summary for the caller", body = Json<DashboardStatsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let stats = state.dashboard_service.stats(user.id).await?;
    Ok(Json(DashboardStatsResponse {
        total_applications: stats.statuses.total,
        active_applications: stats.statuses.active,
        response_rate: stats.statuses.response_rate,
        by_status: stats.statuses.by_status,
        by_priority: stats.by_priority,
        open_tasks: stats.open_tasks,
        upcoming_interviews: stats
            .upcoming_interviews
            .into_iter()
            .map(InterviewResponse::from)
            .collect(),
        recent_applications: stats
            .recent_applications
            .into_iter()
            .map(ApplicationResponse::from)
            .collect(),
    }))
}
