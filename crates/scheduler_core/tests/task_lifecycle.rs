use chrono::NaiveDate;
use rusqlite::Connection;
use scheduler_core::db::open_db_in_memory;
use scheduler_core::{
    next_date, Completion, RecurRule, SqliteTaskRepository, TaskDraft, TaskService,
    TaskServiceError, TASK_LIST_LIMIT,
};

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y%m%d").unwrap()
}

fn draft(date: &str, title: &str, repeat: &str) -> TaskDraft {
    TaskDraft {
        date: date.to_string(),
        title: title.to_string(),
        comment: "note".to_string(),
        repeat: repeat.to_string(),
    }
}

fn service(conn: &Connection) -> TaskService<SqliteTaskRepository<'_>> {
    TaskService::new(SqliteTaskRepository::try_new(conn).unwrap())
}

#[test]
fn create_without_date_uses_today_regardless_of_repeat() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    for repeat in ["", "d 3", "y"] {
        let id = service.create_task(&draft("", "chores", repeat), today).unwrap();
        assert_eq!(service.get_task(id).unwrap().date, today);
    }
}

#[test]
fn create_clamps_past_one_off_date_to_today() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let id = service
        .create_task(&draft("20231201", "overdue", ""), today)
        .unwrap();
    assert_eq!(service.get_task(id).unwrap().date, today);
}

#[test]
fn create_rolls_past_recurring_date_to_next_occurrence() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let weekly = service
        .create_task(&draft("20240101", "weekly", "d 7"), today)
        .unwrap();
    assert_eq!(service.get_task(weekly).unwrap().date, day("20240115"));

    let yearly = service
        .create_task(&draft("20200105", "birthday", "y"), today)
        .unwrap();
    assert_eq!(service.get_task(yearly).unwrap().date, day("20250105"));
}

#[test]
fn create_keeps_today_and_future_dates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let same_day = service
        .create_task(&draft("20240110", "today", "d 5"), today)
        .unwrap();
    let future = service
        .create_task(&draft("20240301", "later", ""), today)
        .unwrap();

    assert_eq!(service.get_task(same_day).unwrap().date, today);
    assert_eq!(service.get_task(future).unwrap().date, day("20240301"));
}

#[test]
fn create_rejects_invalid_input_with_distinct_errors() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let missing_title = service.create_task(&draft("20240110", "", "d 1"), today);
    assert!(matches!(missing_title, Err(TaskServiceError::MissingTitle)));

    let bad_rule = service.create_task(&draft("20240110", "t", "d 500"), today);
    assert!(matches!(bad_rule, Err(TaskServiceError::InvalidRuleFormat(raw)) if raw == "d 500"));

    let bad_date = service.create_task(&draft("2024-13-40", "t", ""), today);
    assert!(matches!(bad_date, Err(TaskServiceError::InvalidDateFormat(raw)) if raw == "2024-13-40"));

    for padded in [" 20250101 ", "20250101 ", " "] {
        let result = service.create_task(&draft(padded, "t", ""), today);
        assert!(
            matches!(&result, Err(TaskServiceError::InvalidDateFormat(raw)) if raw == padded),
            "date `{padded}` should be rejected, got {result:?}"
        );
    }

    assert!(service.list_tasks().unwrap().is_empty());
}

#[test]
fn update_replaces_fields_without_rolling_dates_forward() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let id = service
        .create_task(&draft("", "original", ""), today)
        .unwrap();
    service
        .update_task(id, &draft("20230101", "edited", "d 2"))
        .unwrap();

    let task = service.get_task(id).unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.date, day("20230101"));
    assert_eq!(task.title, "edited");
    assert_eq!(task.repeat, RecurRule::Daily(2));
}

#[test]
fn update_validates_title_rule_and_date() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = service
        .create_task(&draft("", "original", ""), day("20240110"))
        .unwrap();

    assert!(matches!(
        service.update_task(id, &draft("20240101", "", "")),
        Err(TaskServiceError::MissingTitle)
    ));
    assert!(matches!(
        service.update_task(id, &draft("20240101", "t", "x")),
        Err(TaskServiceError::InvalidRuleFormat(_))
    ));
    assert!(matches!(
        service.update_task(id, &draft("", "t", "")),
        Err(TaskServiceError::InvalidDateFormat(_))
    ));
    assert!(matches!(
        service.update_task(id, &draft(" 20240101", "t", "")),
        Err(TaskServiceError::InvalidDateFormat(_))
    ));
    assert_eq!(service.get_task(id).unwrap().title, "original");
}

#[test]
fn update_of_missing_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .update_task(404, &draft("20240101", "ghost", ""))
        .unwrap_err();
    assert!(matches!(err, TaskServiceError::TaskNotFound(404)));
    assert_eq!(err.code(), "task_not_found");
}

#[test]
fn complete_one_off_task_removes_it() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240110");

    let id = service.create_task(&draft("", "once", ""), today).unwrap();
    assert_eq!(service.complete_task(id, today).unwrap(), Completion::Deleted);

    assert!(matches!(
        service.get_task(id),
        Err(TaskServiceError::TaskNotFound(missing)) if missing == id
    ));
}

#[test]
fn complete_recurring_task_advances_date_and_keeps_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create_task(&draft("20240101", "weekly", "d 7"), day("20240101"))
        .unwrap();
    let outcome = service.complete_task(id, day("20240110")).unwrap();
    assert_eq!(outcome, Completion::Rescheduled(day("20240115")));

    let task = service.get_task(id).unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.date, day("20240115"));
    assert_eq!(task.title, "weekly");
    assert_eq!(task.comment, "note");
    assert_eq!(task.repeat, RecurRule::Daily(7));
}

#[test]
fn complete_missing_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(matches!(
        service.complete_task(9, day("20240110")),
        Err(TaskServiceError::TaskNotFound(9))
    ));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create_task(&draft("", "temp", "y"), day("20240110"))
        .unwrap();
    service.delete_task(id).unwrap();
    service.delete_task(id).unwrap();
    service.delete_task(12345).unwrap();

    assert!(matches!(
        service.get_task(id),
        Err(TaskServiceError::TaskNotFound(_))
    ));
}

#[test]
fn list_is_capped_and_sorted_by_date() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let today = day("20240101");

    for offset in (0..40).rev() {
        let date = today + chrono::Days::new(offset);
        let raw = date.format("%Y%m%d").to_string();
        service
            .create_task(&draft(&raw, &format!("task {offset}"), ""), today)
            .unwrap();
    }

    let tasks = service.list_tasks().unwrap();
    assert_eq!(tasks.len(), TASK_LIST_LIMIT as usize);
    assert!(tasks.windows(2).all(|pair| pair[0].date <= pair[1].date));
    assert_eq!(tasks[0].date, today);
}

#[test]
fn next_date_matches_completion_result() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let now = day("20240620");

    let id = service
        .create_task(&draft("20240620", "monthly-ish", "d 30"), now)
        .unwrap();
    let preview = next_date(now, "20240620", "d 30").unwrap();
    let outcome = service.complete_task(id, now).unwrap();

    assert_eq!(preview, "20240720");
    assert_eq!(outcome, Completion::Rescheduled(day(&preview)));
}
