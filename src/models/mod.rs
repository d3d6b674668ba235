// src/models/mod.rs
pub mod access;
pub mod catalog;
pub mod dashboard;
pub mod log_entry;
pub mod notification;
pub mod student;
pub mod tutoring;
pub mod user;
