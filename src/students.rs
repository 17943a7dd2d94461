use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::membership::assign_group_fields;
use crate::models::{AssignGroupPayload, MessageResponse, Student};

pub async fn get_students(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Student>>), ApiError> {
    let students = app_state.students().list().await?;
    Ok((StatusCode::OK, Json(students)))
}

pub async fn create_student(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student = app_state.students().create(payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update_student(
    State(app_state): State<AppState>,
    PathParam(student_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student = app_state.students().update(student_id, payload).await?;
    Ok((StatusCode::OK, Json(student)))
}

/// Writes `groupId` / `group` straight onto the student; group membership
/// lists are not touched (use the group add/remove endpoints for that).
pub async fn update_student_group(
    State(app_state): State<AppState>,
    PathParam(student_id): PathParam<i64>,
    JsonBody(payload): JsonBody<AssignGroupPayload>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student = assign_group_fields(
        &app_state.store,
        student_id,
        payload.group_id,
        payload.group_name,
    )
    .await?;
    Ok((StatusCode::OK, Json(student)))
}

pub async fn delete_student(
    State(app_state): State<AppState>,
    PathParam(student_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.students().delete(student_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Student deleted".to_string(),
        }),
    ))
}
