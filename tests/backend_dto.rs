use modalist::backend::{ModeDto, TaskDto};

#[test]
fn task_dto_uses_camel_case_mode_reference_on_the_wire() {
    let dto = TaskDto {
        id: 4,
        title: "Write report".to_string(),
        mode_id: 9,
        is_completed: false,
        time_logged: 120,
        is_deleted: false,
    };

    let value = serde_json::to_value(&dto).unwrap();
    assert_eq!(value["modeId"], 9);
    assert!(value.get("mode_id").is_none());
}

#[test]
fn dtos_tolerate_minimal_payloads() {
    // Create responses may omit fields the serializer treats as read-only.
    let task: TaskDto =
        serde_json::from_str(r#"{"title": "Bare", "modeId": 3}"#).unwrap();
    assert_eq!(task.id, 0);
    assert_eq!(task.mode_id, 3);
    assert!(!task.is_completed);
    assert_eq!(task.time_logged, 0);

    let mode: ModeDto =
        serde_json::from_str(r##"{"title": "Bare", "color": "#fff"}"##).unwrap();
    assert_eq!(mode.id, 0);
    assert!(!mode.is_deleted);
}
