//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate recurrence rules and store calls into task lifecycle APIs.
//! - Keep HTTP and process wiring decoupled from storage details.

pub mod task_service;
