mod common;

use axum::http::StatusCode;
use serde_json::json;

struct Fixture {
    teacher_id: i64,
    other_teacher_id: i64,
    group_id: i64,
}

async fn seed(app: &common::TestApp) -> Fixture {
    let teacher_id = common::create(app, "teachers", json!({"name": "Aziz"})).await;
    let other_teacher_id = common::create(app, "teachers", json!({"name": "Dilnoza"})).await;
    let group_id = common::create(
        app,
        "groups",
        json!({"name": "Python", "teacherId": teacher_id}),
    )
    .await;
    Fixture {
        teacher_id,
        other_teacher_id,
        group_id,
    }
}

#[tokio::test]
async fn owning_teacher_can_create_tasks() {
    let app = common::setup_test_app().await.expect("setup failed");
    let fx = seed(&app).await;

    let (status, task) = common::post(
        &app,
        "/tasks",
        json!({
            "groupId": fx.group_id,
            "teacherId": fx.teacher_id,
            "title": "Homework 1",
            "dueDate": "2025-02-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], json!("pending"));
    assert_eq!(task["description"], json!(""));
    assert!(task["createdAt"].is_string());

    let (status, tasks) = common::get(&app, "/tasks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks[0]["groupName"], json!("Python"));
    assert_eq!(tasks[0]["teacherName"], json!("Aziz"));
}

#[tokio::test]
async fn task_creation_checks_group_and_teacher() {
    let app = common::setup_test_app().await.expect("setup failed");
    let fx = seed(&app).await;

    let (status, body) = common::post(
        &app,
        "/tasks",
        json!({"groupId": 1, "teacherId": fx.teacher_id, "title": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Group not found"));

    let (status, body) = common::post(
        &app,
        "/tasks",
        json!({"groupId": fx.group_id, "teacherId": 1, "title": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Teacher not found"));

    let (status, body) = common::post(
        &app,
        "/tasks",
        json!({"groupId": fx.group_id, "teacherId": fx.other_teacher_id, "title": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    assert_eq!(common::read_collection(&app, "tasks"), json!([]));
}

#[tokio::test]
async fn tasks_filter_by_group_and_support_update_delete() {
    let app = common::setup_test_app().await.expect("setup failed");
    let fx = seed(&app).await;
    let task_id = common::create(
        &app,
        "tasks",
        json!({"groupId": fx.group_id, "teacherId": fx.teacher_id, "title": "Essay"}),
    )
    .await;

    let (status, tasks) = common::get(&app, &format!("/tasks/group/{}", fx.group_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));

    let (_, none) = common::get(&app, "/tasks/group/1").await;
    assert_eq!(none, json!([]));

    let (status, updated) =
        common::put(&app, &format!("/tasks/{}", task_id), json!({"status": "done"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], json!("done"));
    assert_eq!(updated["title"], json!("Essay"));

    let (status, _) = common::delete(&app, &format!("/tasks/{}", task_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, tasks) = common::get(&app, "/tasks").await;
    assert_eq!(tasks, json!([]));
}
