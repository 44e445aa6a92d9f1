use chrono::NaiveDate;
use scheduler_core::{RecurRule, Task, TaskDraft};

#[test]
fn task_serialization_uses_wire_formats() {
    let task = Task {
        id: 17,
        date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        title: "leap check".to_string(),
        comment: String::new(),
        repeat: RecurRule::Daily(14),
    };

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 17);
    assert_eq!(json["date"], "20240229");
    assert_eq!(json["repeat"], "d 14");

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn task_deserialize_rejects_invalid_rule() {
    let value = serde_json::json!({
        "id": 1,
        "date": "20240101",
        "title": "t",
        "comment": "",
        "repeat": "d 401"
    });

    let err = serde_json::from_value::<Task>(value).unwrap_err();
    assert!(
        err.to_string().contains("incorrect repeat format"),
        "unexpected error: {err}"
    );
}

#[test]
fn draft_fields_default_to_empty() {
    let draft: TaskDraft = serde_json::from_value(serde_json::json!({ "title": "only" })).unwrap();
    assert_eq!(draft.title, "only");
    assert!(draft.date.is_empty());
    assert!(draft.repeat.is_empty());
    assert!(draft.comment.is_empty());
}

#[test]
fn one_off_is_derived_from_rule() {
    let mut task = Task {
        id: 1,
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        title: "t".to_string(),
        comment: String::new(),
        repeat: RecurRule::None,
    };
    assert!(task.is_one_off());

    task.repeat = RecurRule::Yearly;
    assert!(!task.is_one_off());
}
