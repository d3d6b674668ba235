// src/services/mod.rs
pub mod access_service;
pub mod auth_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod log_entry_service;
pub mod notification_service;
pub mod report_service;
pub mod student_service;
pub mod tutoring_service;
pub mod user_service;
