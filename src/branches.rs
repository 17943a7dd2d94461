use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Map, Value};

use crate::AppState;
use crate::companies::with_org_defaults;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::models::{Branch, BranchFilter, MessageResponse};
use crate::utils::lenient::int_from_value;

pub async fn get_branches(
    State(app_state): State<AppState>,
    QueryParams(filter): QueryParams<BranchFilter>,
) -> Result<(StatusCode, Json<Vec<Branch>>), ApiError> {
    let branches = app_state
        .branches()
        .list()
        .await?
        .into_iter()
        .filter(|b| filter.company_id.is_none() || b.company_id == filter.company_id)
        .collect();
    Ok((StatusCode::OK, Json(branches)))
}

/// A branch must belong to an existing company. Login credentials sent along
/// with the form are not stored.
pub async fn create_branch(
    State(app_state): State<AppState>,
    JsonBody(mut payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    let company_id = payload
        .get("companyId")
        .map(int_from_value)
        .transpose()
        .map_err(ApiError::Validation)?
        .flatten()
        .ok_or(ApiError::NotFound("Company"))?;
    app_state.companies().find(company_id).await?;

    for credential in ["username", "password"] {
        payload.remove(credential);
    }
    payload.insert("companyId".to_string(), Value::from(company_id));

    let branch = app_state
        .branches()
        .create(with_org_defaults(payload))
        .await?;
    tracing::info!(branch_id = branch.id, company_id, "branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn update_branch(
    State(app_state): State<AppState>,
    PathParam(branch_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    let branch = app_state.branches().update(branch_id, payload).await?;
    Ok((StatusCode::OK, Json(branch)))
}

pub async fn delete_branch(
    State(app_state): State<AppState>,
    PathParam(branch_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.branches().delete(branch_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Branch deleted".to_string(),
        }),
    ))
}
