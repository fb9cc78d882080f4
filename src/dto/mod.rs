pub mod application_dto;
pub mod auth_dto;
pub mod company_dto;
pub mod dashboard_dto;
pub mod document_dto;
pub mod interview_dto;
pub mod task_dto;
