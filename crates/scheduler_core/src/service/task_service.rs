//! Task lifecycle service.
//!
//! # Responsibility
//! - Validate task input at every mutation entry point.
//! - Normalize due dates on create and advance recurring tasks on completion.
//! - Delegate persistence to an injected [`TaskStore`].
//!
//! # Invariants
//! - All validation happens before the store is touched.
//! - Create rolls a past date forward (to today, or to the next occurrence of
//!   its rule); update persists past dates as given.
//! - Completing a one-off task deletes it; completing a recurring task keeps
//!   its id and moves `date` to the next occurrence after `now`.
//! - Delete is idempotent.

use crate::model::rule::{RecurRule, RuleFormatError};
use crate::model::task::{
    format_task_date, parse_task_date, DateFormatError, NewTask, Task, TaskDraft, TaskId,
    TaskValidationError,
};
use crate::recurrence::{next_occurrence, RecurrenceError};
use crate::repo::task_repo::{RepoError, TaskStore};
use chrono::NaiveDate;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of tasks returned by [`TaskService::list_tasks`].
pub const TASK_LIST_LIMIT: u32 = 25;

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Errors from task lifecycle operations.
///
/// Each variant has a stable [`code`](TaskServiceError::code) so boundary
/// layers can pick a response without parsing messages.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is empty.
    MissingTitle,
    /// Date text is not `YYYYMMDD`.
    InvalidDateFormat(String),
    /// Repeat rule text is not recognized or out of range.
    InvalidRuleFormat(String),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Next occurrence could not be computed.
    Recurrence(RecurrenceError),
    /// Persistence-layer failure, passed through unchanged.
    Storage(RepoError),
}

impl TaskServiceError {
    /// Stable machine-readable identity of this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::InvalidDateFormat(_) => "invalid_date_format",
            Self::InvalidRuleFormat(_) => "invalid_rule_format",
            Self::TaskNotFound(_) => "task_not_found",
            Self::Recurrence(_) => "recurrence_failed",
            Self::Storage(_) => "storage_failure",
        }
    }

    /// Returns whether the caller supplied bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingTitle
                | Self::InvalidDateFormat(_)
                | Self::InvalidRuleFormat(_)
                | Self::Recurrence(_)
        )
    }
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "task title is required"),
            Self::InvalidDateFormat(raw) => write!(f, "incorrect date: `{raw}`"),
            Self::InvalidRuleFormat(raw) => write!(f, "incorrect repeat format: `{raw}`"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Recurrence(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Recurrence(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            RepoError::Validation(TaskValidationError::EmptyTitle) => Self::MissingTitle,
            other => Self::Storage(other),
        }
    }
}

impl From<RecurrenceError> for TaskServiceError {
    fn from(value: RecurrenceError) -> Self {
        match value {
            RecurrenceError::InvalidDateFormat(raw) => Self::InvalidDateFormat(raw),
            RecurrenceError::InvalidRuleFormat(raw) => Self::InvalidRuleFormat(raw),
            other => Self::Recurrence(other),
        }
    }
}

impl From<DateFormatError> for TaskServiceError {
    fn from(value: DateFormatError) -> Self {
        Self::InvalidDateFormat(value.raw)
    }
}

impl From<RuleFormatError> for TaskServiceError {
    fn from(value: RuleFormatError) -> Self {
        Self::InvalidRuleFormat(value.raw)
    }
}

/// Outcome of [`TaskService::complete_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// One-off task was removed.
    Deleted,
    /// Recurring task now falls due on this date.
    Rescheduled(NaiveDate),
}

/// Task lifecycle facade over a store implementation.
pub struct TaskService<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskService<S> {
    /// Creates a service using the provided store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates, date-normalizes and persists a new task.
    ///
    /// # Contract
    /// - Empty `date` becomes `now`.
    /// - A date before `now` becomes `now` for one-off tasks, or the next
    ///   occurrence after `now` for recurring ones.
    /// - Returns the store-assigned id.
    pub fn create_task(&self, draft: &TaskDraft, now: NaiveDate) -> TaskServiceResult<TaskId> {
        let repeat = validate_title_and_rule(draft)?;

        let date = if draft.date.is_empty() {
            now
        } else {
            let parsed = parse_task_date(&draft.date)?;
            if parsed >= now {
                parsed
            } else if repeat.is_recurring() {
                next_occurrence(now, parsed, repeat)?
            } else {
                now
            }
        };

        let task = NewTask {
            date,
            title: draft.title.clone(),
            comment: draft.comment.clone(),
            repeat,
        };
        let id = self.store.create_task(&task).map_err(log_storage("task_create"))?;
        info!(
            "event=task_create module=task status=ok id={id} date={} recurring={}",
            format_task_date(date),
            repeat.is_recurring()
        );
        Ok(id)
    }

    /// Loads one task by id.
    pub fn get_task(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.store
            .get_task(id)
            .map_err(log_storage("task_get"))?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Replaces title, date, comment and repeat of an existing task.
    ///
    /// The date must be a valid `YYYYMMDD` value but is stored as given, even
    /// when it lies in the past.
    pub fn update_task(&self, id: TaskId, draft: &TaskDraft) -> TaskServiceResult<()> {
        let repeat = validate_title_and_rule(draft)?;
        let date = parse_task_date(&draft.date)?;

        let task = Task {
            id,
            date,
            title: draft.title.clone(),
            comment: draft.comment.clone(),
            repeat,
        };
        self.store.update_task(&task).map_err(log_storage("task_update"))?;
        info!(
            "event=task_update module=task status=ok id={id} date={}",
            format_task_date(date)
        );
        Ok(())
    }

    /// Marks a task done.
    ///
    /// # Contract
    /// - One-off task: deleted.
    /// - Recurring task: `date` advanced to the first occurrence after `now`;
    ///   id and other fields unchanged.
    pub fn complete_task(&self, id: TaskId, now: NaiveDate) -> TaskServiceResult<Completion> {
        let mut task = self.get_task(id)?;

        if task.is_one_off() {
            self.store.delete_task(id).map_err(log_storage("task_complete"))?;
            info!("event=task_complete module=task status=ok id={id} outcome=deleted");
            return Ok(Completion::Deleted);
        }

        let next = next_occurrence(now, task.date, task.repeat)?;
        task.date = next;
        self.store.update_task(&task).map_err(log_storage("task_complete"))?;
        info!(
            "event=task_complete module=task status=ok id={id} outcome=rescheduled date={}",
            format_task_date(next)
        );
        Ok(Completion::Rescheduled(next))
    }

    /// Removes a task. Deleting a missing id succeeds.
    pub fn delete_task(&self, id: TaskId) -> TaskServiceResult<()> {
        let removed = self.store.delete_task(id).map_err(log_storage("task_delete"))?;
        info!("event=task_delete module=task status=ok id={id} removed={removed}");
        Ok(())
    }

    /// Lists the soonest-due tasks, capped at [`TASK_LIST_LIMIT`].
    pub fn list_tasks(&self) -> TaskServiceResult<Vec<Task>> {
        let tasks = self
            .store
            .list_tasks(TASK_LIST_LIMIT)
            .map_err(log_storage("task_list"))?;
        debug!("event=task_list module=task status=ok count={}", tasks.len());
        Ok(tasks)
    }
}

fn validate_title_and_rule(draft: &TaskDraft) -> TaskServiceResult<RecurRule> {
    if draft.title.trim().is_empty() {
        return Err(TaskServiceError::MissingTitle);
    }
    Ok(draft.repeat.parse::<RecurRule>()?)
}

fn log_storage(event: &'static str) -> impl Fn(RepoError) -> RepoError {
    move |err| {
        if !matches!(err, RepoError::NotFound(_) | RepoError::Validation(_)) {
            error!("event={event} module=task status=error error_code=storage_failure error={err}");
        }
        err
    }
}
