use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::{MessageResponse, Teacher};

pub async fn get_teachers(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Teacher>>), ApiError> {
    let teachers = app_state.teachers().list().await?;
    Ok((StatusCode::OK, Json(teachers)))
}

pub async fn create_teacher(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Teacher>), ApiError> {
    let teacher = app_state.teachers().create(payload).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update_teacher(
    State(app_state): State<AppState>,
    PathParam(teacher_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Teacher>), ApiError> {
    let teacher = app_state.teachers().update(teacher_id, payload).await?;
    Ok((StatusCode::OK, Json(teacher)))
}

/// Groups referencing the teacher keep their (now dangling) `teacherId`.
pub async fn delete_teacher(
    State(app_state): State<AppState>,
    PathParam(teacher_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.teachers().delete(teacher_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Teacher deleted".to_string(),
        }),
    ))
}
