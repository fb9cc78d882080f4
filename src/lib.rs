pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, auth_service::AuthService,
    company_service::CompanyService, dashboard_service::DashboardService,
    document_service::DocumentService, interview_service::InterviewService,
    task_service::TaskService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
    pub task_service: TaskService,
    pub document_service: DocumentService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let auth_service = AuthService::new(
            pool.clone(),
            config.jwt_secret.clone(),
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        );
        let company_service = CompanyService::new(pool.clone());
        let application_service = ApplicationService::new(pool.clone());
        let interview_service = InterviewService::new(pool.clone());
        let task_service = TaskService::new(pool.clone());
        let document_service = DocumentService::new(
            pool.clone(),
            config.uploads_dir.clone(),
            config.max_upload_bytes,
        );
        let dashboard_service = DashboardService::new(pool.clone());

        Self {
            pool,
            auth_service,
            company_service,
            application_service,
            interview_service,
            task_service,
            document_service,
            dashboard_service,
        }
    }
}
