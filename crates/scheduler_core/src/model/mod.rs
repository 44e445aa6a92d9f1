//! Domain model for scheduled tasks.
//!
//! # Responsibility
//! - Define the task record, its validated and raw input shapes.
//! - Define the recurrence rule variant and the `YYYYMMDD` date wire format.
//!
//! # Invariants
//! - A persisted task always has a non-empty title and a valid calendar date.
//! - Rule strings are parsed once into [`rule::RecurRule`] at the boundary.

pub mod rule;
pub mod task;
