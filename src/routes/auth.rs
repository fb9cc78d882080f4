use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{AuthResponse, LoginPayload, RefreshPayload, RegisterPayload, UserResponse},
    error::Result,
    middleware::auth::AuthUser,
    models::user::User,
    services::auth_service::IssuedTokens,
    AppState,
};

fn auth_response(user: User, tokens: IssuedTokens) -> AuthResponse {
    AuthResponse {
        user: UserResponse::from(user),
        token_type: "Bearer".to_string(),
        access_token: tokens.access_token,
        access_token_expires_at: tokens.access_token_expires_at,
        refresh_token: tokens.refresh_token,
        refresh_token_expires_at: tokens.refresh_token_expires_at,
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = Json<AuthResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    let (user, tokens) = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(auth_response(user, tokens))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in", body = Json<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    let (user, tokens) = state.auth_service.login(payload).await?;
    Ok(Json(auth_response(user, tokens)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Token pair rotated", body = Json<AuthResponse>),
        (status = 401, description = "Refresh token invalid, revoked or expired")
    )
)]
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (user, tokens) = state.auth_service.refresh(&payload.refresh_token).await?;
    Ok(Json(auth_response(user, tokens)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = RefreshPayload,
    responses(
        (status = 204, description = "Refresh token revoked")
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.logout(&payload.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = Json<UserResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(user.id).await?;
    Ok(Json(UserResponse::from(user)))
}
