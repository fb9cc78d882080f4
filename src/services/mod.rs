pub mod application_service;
pub mod auth_service;
pub mod company_service;
pub mod dashboard_service;
pub mod document_service;
pub mod interview_service;
pub mod status_recorder;
pub mod task_service;
