//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD over the `scheduler` table.
//! - Keep SQL and the `YYYYMMDD`/rule text encodings inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate the task before SQL mutations.
//! - Read paths reject malformed persisted dates and rules instead of masking them.
//! - Inserts run in one transaction together with the id read-back.
//! - Listing is ordered by `date ASC, id ASC`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::rule::RecurRule;
use crate::model::task::{
    format_task_date, parse_task_date, NewTask, Task, TaskId, TaskValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    date,
    title,
    comment,
    repeat
FROM scheduler";

const REQUIRED_COLUMNS: [&str; 5] = ["id", "date", "title", "comment", "repeat"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from task persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Task failed field validation before a write.
    Validation(TaskValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No row with this id exists.
    NotFound(TaskId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be converted into a valid task.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable keyed storage for tasks.
pub trait TaskStore {
    /// Inserts a task and returns the identifier assigned to it.
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId>;
    /// Loads one task, `None` when absent.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Replaces every field of an existing task. `NotFound` when absent.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Removes one task. Returns whether a row was removed.
    fn delete_task(&self, id: TaskId) -> RepoResult<bool>;
    /// Lists up to `limit` tasks, soonest due first.
    fn list_tasks(&self, limit: u32) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task store.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is foreign.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_task_schema(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection that already passed [`ensure_task_schema`].
    ///
    /// Long-lived callers check the schema once at startup and use this per
    /// unit of work.
    pub fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskStore for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO scheduler (date, title, comment, repeat)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                format_task_date(task.date),
                task.title.as_str(),
                task.comment.as_str(),
                task.repeat.to_string(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt.query_row([id], read_raw_row).optional()?;
        row.map(RawTaskRow::into_task).transpose()
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE scheduler
             SET
                date = ?1,
                title = ?2,
                comment = ?3,
                repeat = ?4
             WHERE id = ?5;",
            params![
                format_task_date(task.date),
                task.title.as_str(),
                task.comment.as_str(),
                task.repeat.to_string(),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM scheduler WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn list_tasks(&self, limit: u32) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             ORDER BY date ASC, id ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(read_raw_row(row)?.into_task()?);
        }

        Ok(tasks)
    }
}

/// Row as stored, before date/rule decoding.
struct RawTaskRow {
    id: TaskId,
    date: String,
    title: String,
    comment: String,
    repeat: String,
}

impl RawTaskRow {
    fn into_task(self) -> RepoResult<Task> {
        let date = parse_task_date(&self.date).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid date `{}` in scheduler.date for id {}",
                self.date, self.id
            ))
        })?;
        let repeat = self.repeat.parse::<RecurRule>().map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid repeat rule `{}` in scheduler.repeat for id {}",
                self.repeat, self.id
            ))
        })?;

        let task = Task {
            id: self.id,
            date,
            title: self.title,
            comment: self.comment,
            repeat,
        };
        task.validate()
            .map_err(|err| RepoError::InvalidData(format!("{err} (id {})", task.id)))?;
        Ok(task)
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawTaskRow> {
    Ok(RawTaskRow {
        id: row.get("id")?,
        date: row.get("date")?,
        title: row.get("title")?,
        comment: row.get("comment")?,
        repeat: row.get("repeat")?,
    })
}

/// Checks that `conn` is migrated and holds the `scheduler` table with every
/// column the repository reads.
///
/// # Errors
/// - `UninitializedConnection` when migrations have not been applied.
/// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is foreign.
pub fn ensure_task_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    // `table_info` yields no rows for a missing table, so one pass covers both checks.
    let columns = table_columns(conn, "scheduler")?;
    if columns.is_empty() {
        return Err(RepoError::MissingRequiredTable("scheduler"));
    }

    if let Some(column) = REQUIRED_COLUMNS
        .into_iter()
        .find(|column| !columns.iter().any(|current| current.as_str() == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: "scheduler",
            column,
        });
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}
