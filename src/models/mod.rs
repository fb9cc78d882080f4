pub mod application;
pub mod company;
pub mod document;
pub mod enums;
pub mod interview;
pub mod status_history;
pub mod task;
pub mod user;
