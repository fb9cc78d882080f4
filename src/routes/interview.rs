use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::interview_dto::{
        CreateInterviewPayload, InterviewResponse, UpcomingInterviewQuery, UpdateInterviewPayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

const DEFAULT_UPCOMING_DAYS: i64 = 7;
const UPCOMING_LIMIT: i64 = 100;

#[utoipa::path(
    post,
    path = "/api/applications/{id}/interviews",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = CreateInterviewPayload,
    responses(
        (status = 201, description = "Interview scheduled", body = Json<InterviewResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn create_interview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<CreateInterviewPayload>,
) -> Result<impl IntoResponse> {
    let new = payload.into_new_interview()?;
    let interview = state
        .interview_service
        .create(user.id, application_id, new)
        .await?;
    Ok((StatusCode::CREATED, Json(InterviewResponse::from(interview))))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/interviews",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Interviews of the application", body = Json<Vec<InterviewResponse>>),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn list_application_interviews(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state
        .interview_service
        .list_for_application(user.id, application_id)
        .await?;
    let items: Vec<InterviewResponse> = items.into_iter().map(InterviewResponse::from).collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/interviews/upcoming",
    params(
        ("days" = Option<i64>, Query, description = "Look-ahead window in days (1-90)")
    ),
    responses(
        (status = 200, description = "Upcoming interviews", body = Json<Vec<InterviewResponse>>)
    )
)]
#[axum::debug_handler]
pub async fn list_upcoming_interviews(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<UpcomingInterviewQuery>,
) -> Result<impl IntoResponse> {
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    let items = state
        .interview_service
        .upcoming(user.id, days, UPCOMING_LIMIT)
        .await?;
    let items: Vec<InterviewResponse> = items.into_iter().map(InterviewResponse::from).collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview found", body = Json<InterviewResponse>),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get(user.id, id).await?;
    Ok(Json(InterviewResponse::from(interview)))
}

#[utoipa::path(
    put,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    request_body = UpdateInterviewPayload,
    responses(
        (status = 200, description = "Interview updated", body = Json<InterviewResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn update_interview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInterviewPayload>,
) -> Result<impl IntoResponse> {
    let changes = payload.into_changes()?;
    let interview = state.interview_service.update(user.id, id, changes).await?;
    Ok(Json(InterviewResponse::from(interview)))
}

#[utoipa::path(
    delete,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 204, description = "Interview deleted"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_interview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.interview_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
