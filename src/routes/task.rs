use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::task_dto::{CreateTaskPayload, TaskResponse, UpdateTaskPayload},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/{id}/tasks",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Task created", body = Json<TaskResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let task = state
        .task_service
        .create(user.id, application_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/tasks",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Tasks of the application", body = Json<Vec<TaskResponse>>),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn list_application_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state
        .task_service
        .list_for_application(user.id, application_id)
        .await?;
    let items: Vec<TaskResponse> = items.into_iter().map(TaskResponse::from).collect();
    Ok(Json(items))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTaskPayload,
    responses(
        (status = 200, description = "Task updated", body = Json<TaskResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Task not found")
    )
)]
#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let task = state.task_service.update(user.id, id, payload).await?;
    Ok(Json(TaskResponse::from(task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.task_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
