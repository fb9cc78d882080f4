pub mod application;
pub mod auth;
pub mod company;
pub mod dashboard;
pub mod document;
pub mod health;
pub mod interview;
pub mod task;
pub mod vocabulary;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{middleware::auth::require_bearer_auth, AppState};

/// Room for multipart boundaries and the non-file parts on top of the file
/// itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the full HTTP surface. Everything except `/health` and the
/// credential exchange endpoints sits behind bearer authentication.
pub fn router(state: AppState) -> Router {
    let upload_limit = crate::config::get_config().max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout));

    let protected_api = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/vocabulary", get(vocabulary::get_vocabulary))
        .route(
            "/api/companies",
            get(company::list_companies).post(company::create_company),
        )
        .route(
            "/api/companies/:id",
            get(company::get_company)
                .put(company::update_company)
                .delete(company::delete_company),
        )
        .route(
            "/api/applications",
            get(application::list_applications).post(application::create_application),
        )
        .route(
            "/api/applications/:id",
            get(application::get_application)
                .put(application::update_application)
                .delete(application::delete_application),
        )
        .route(
            "/api/applications/:id/history",
            get(application::get_application_history),
        )
        .route(
            "/api/applications/:id/interviews",
            get(interview::list_application_interviews).post(interview::create_interview),
        )
        .route(
            "/api/applications/:id/tasks",
            get(task::list_application_tasks).post(task::create_task),
        )
        .route(
            "/api/interviews/upcoming",
            get(interview::list_upcoming_interviews),
        )
        .route(
            "/api/interviews/:id",
            get(interview::get_interview)
                .put(interview::update_interview)
                .delete(interview::delete_interview),
        )
        .route(
            "/api/tasks/:id",
            axum::routing::put(task::update_task).delete(task::delete_task),
        )
        .route(
            "/api/documents",
            get(document::list_documents)
                .post(document::upload_document)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/documents/:id",
            get(document::get_document).delete(document::delete_document),
        )
        .route(
            "/api/documents/:id/download",
            get(document::download_document),
        )
        .route(
            "/api/dashboard/stats",
            get(dashboard::get_dashboard_stats),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    public_api.merge(protected_api).with_state(state)
}
