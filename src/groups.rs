use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::AppState;
use crate::constants::{MSG_STUDENT_ADDED, MSG_STUDENT_REMOVED};
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::joins::{group_detail, list_groups_with_details};
use crate::membership::{
    add_student_to_group, create_group as create_group_with_students,
    remove_student_from_group, update_group as merge_group,
};
use crate::models::{
    CreateGroupPayload, Group, MembershipPayload, MembershipResponse, MessageResponse,
};
use crate::utils::require_id;

pub async fn get_groups(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Map<String, Value>>>), ApiError> {
    let groups = list_groups_with_details(&app_state.store).await?;
    Ok((StatusCode::OK, Json(groups)))
}

pub async fn get_group(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
) -> Result<(StatusCode, Json<Map<String, Value>>), ApiError> {
    let group = group_detail(&app_state.store, group_id).await?;
    Ok((StatusCode::OK, Json(group)))
}

pub async fn create_group(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<CreateGroupPayload>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = create_group_with_students(&app_state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = merge_group(&app_state.store, group_id, payload).await?;
    Ok((StatusCode::OK, Json(group)))
}

pub async fn add_student(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
    JsonBody(payload): JsonBody<MembershipPayload>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    let student_id = require_id(payload.student_id, "studentId")?;
    let group = add_student_to_group(&app_state.store, group_id, student_id).await?;
    Ok((
        StatusCode::OK,
        Json(MembershipResponse {
            message: MSG_STUDENT_ADDED.to_string(),
            group,
        }),
    ))
}

pub async fn remove_student(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
    JsonBody(payload): JsonBody<MembershipPayload>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    let student_id = require_id(payload.student_id, "studentId")?;
    let group = remove_student_from_group(&app_state.store, group_id, student_id).await?;
    Ok((
        StatusCode::OK,
        Json(MembershipResponse {
            message: MSG_STUDENT_REMOVED.to_string(),
            group,
        }),
    ))
}

/// Students keep pointing at the deleted group.
pub async fn delete_group(
    State(app_state): State<AppState>,
    PathParam(group_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.groups().delete(group_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Group deleted".to_string(),
        }),
    ))
}
