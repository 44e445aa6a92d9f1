//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow storage contract consumed by the task lifecycle.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod task_repo;
