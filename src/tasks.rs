use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::AppState;
use crate::constants::*;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::joins::list_tasks_with_names;
use crate::models::{CreateTaskPayload, Group, MessageResponse, Task, Teacher};
use crate::repository::fresh_id;
use crate::store::DocumentStore;
use crate::utils::{now_rfc3339, or_default_text};

/// Creates an assignment for a group. The teacher must be the one the
/// group is assigned to.
pub async fn create_task_for_group(
    store: &DocumentStore,
    payload: CreateTaskPayload,
) -> Result<Task, ApiError> {
    let groups: Vec<Group> = store.load(GROUPS_COLLECTION).await?;
    let group = payload
        .group_id
        .and_then(|id| groups.iter().find(|g| g.id == id))
        .ok_or(ApiError::NotFound("Group"))?;

    let teachers: Vec<Teacher> = store.load(TEACHERS_COLLECTION).await?;
    let teacher = payload
        .teacher_id
        .and_then(|id| teachers.iter().find(|t| t.id == id))
        .ok_or(ApiError::NotFound("Teacher"))?;

    if group.teacher_id != Some(teacher.id) {
        tracing::warn!(
            group_id = group.id,
            teacher_id = teacher.id,
            "teacher does not own group"
        );
        return Err(ApiError::Forbidden(
            "Teacher is not assigned to this group".to_string(),
        ));
    }

    let _guard = store.lock().await;
    let mut tasks: Vec<Task> = store.load(TASKS_COLLECTION).await?;

    let mut extra = payload.extra;
    for reserved in ["id", "createdAt"] {
        extra.remove(reserved);
    }

    let task = Task {
        id: fresh_id(store, &tasks),
        group_id: Some(group.id),
        teacher_id: Some(teacher.id),
        description: Some(payload.description.unwrap_or_else(|| Value::from(""))),
        status: Some(or_default_text(payload.status, TASK_STATUS_PENDING)),
        created_at: Some(Value::from(now_rfc3339())),
        extra,
    };
    tasks.push(task.clone());
    store.save(TASKS_COLLECTION, &tasks).await?;

    tracing::info!(task_id = task.id, group_id = group.id, "task created");
    Ok(task)
}

pub async fn get_tasks(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Map<String, Value>>>), ApiError> {
    let tasks = list_tasks_with_names(&app_state.store).await?;
    Ok((StatusCode::OK, Json(tasks)))
}

pub async fn get_tasks_by_group(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
) -> Result<(StatusCode, Json<Vec<Task>>), ApiError> {
    let tasks = app_state
        .tasks()
        .list()
        .await?
        .into_iter()
        .filter(|t| t.group_id == Some(group_id))
        .collect();
    Ok((StatusCode::OK, Json(tasks)))
}

pub async fn create_task(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = create_task_for_group(&app_state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(app_state): State<AppState>,
    PathParam(task_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = app_state.tasks().update(task_id, payload).await?;
    Ok((StatusCode::OK, Json(task)))
}

pub async fn delete_task(
    State(app_state): State<AppState>,
    PathParam(task_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.tasks().delete(task_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Task deleted".to_string(),
        }),
    ))
}
