// src/web/mod.rs
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod log_entry_handlers;
pub mod mw_auth;
pub mod notification_handlers;
pub mod page;
pub mod routes;
pub mod student_handlers;
pub mod tutoring_handlers;
