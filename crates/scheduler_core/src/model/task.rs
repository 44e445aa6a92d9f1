//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted task record and the shapes used to create/replace it.
//! - Own the `YYYYMMDD` calendar-date wire format.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `title` is non-empty for every task that reached the store.
//! - `date` is a calendar date without time of day.

use super::rule::RecurRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// `chrono` format string of the 8-digit task date.
pub const TASK_DATE_FORMAT: &str = "%Y%m%d";

/// Date text that is not an 8-digit `YYYYMMDD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatError {
    pub raw: String,
}

impl Display for DateFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "incorrect date: `{}`", self.raw)
    }
}

impl Error for DateFormatError {}

/// Parses an 8-digit `YYYYMMDD` date.
///
/// Rejects separators, signs and other widths even when `chrono` alone would
/// accept them, so `2024-01-01` and `240101` both fail.
pub fn parse_task_date(raw: &str) -> Result<NaiveDate, DateFormatError> {
    let invalid = || DateFormatError {
        raw: raw.to_string(),
    };
    if raw.len() != 8 || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, TASK_DATE_FORMAT).map_err(|_| invalid())
}

/// Formats a date as `YYYYMMDD`.
pub fn format_task_date(date: NaiveDate) -> String {
    date.format(TASK_DATE_FORMAT).to_string()
}

/// Field invariant violations on a task about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(())
}

/// Unvalidated create/update input as received from callers.
///
/// Every field is raw text; an empty `date` means "today" on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

/// Validated task waiting for a store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub date: NaiveDate,
    pub title: String,
    pub comment: String,
    pub repeat: RecurRule,
}

impl NewTask {
    /// Checks field invariants required before insert.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }

    /// Attaches the identifier the store assigned on insert.
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            date: self.date,
            title: self.title,
            comment: self.comment,
            repeat: self.repeat,
        }
    }
}

/// Persisted scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Next (or only) due date. Serialized as `YYYYMMDD`.
    #[serde(with = "task_date_serde")]
    pub date: NaiveDate,
    pub title: String,
    pub comment: String,
    /// Serialized with the rule wire form (`""`, `d <n>`, `y`).
    pub repeat: RecurRule,
}

impl Task {
    /// Checks field invariants required before update and after read.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }

    /// Returns whether completion removes this task instead of rescheduling it.
    pub fn is_one_off(&self) -> bool {
        !self.repeat.is_recurring()
    }
}

mod task_date_serde {
    use super::{format_task_date, parse_task_date};
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_task_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_task_date(&raw).map_err(D::Error::custom)
    }
}
