use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Map, Value};

use crate::AppState;
use crate::constants::ORG_STATUS_ACTIVE;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::models::{Company, MessageResponse};
use crate::utils::{now_rfc3339, or_default_text};

/// Defaults shared by companies and branches: blank contact fields,
/// `status` "active" and a fresh `createdAt`.
pub(crate) fn with_org_defaults(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in ["address", "phone", "email"] {
        fields.entry(key).or_insert_with(|| Value::from(""));
    }
    let status = or_default_text(fields.remove("status"), ORG_STATUS_ACTIVE);
    fields.insert("status".to_string(), status);
    fields.insert("createdAt".to_string(), Value::from(now_rfc3339()));
    fields
}

pub async fn get_companies(
    State(app_state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Company>>), ApiError> {
    let companies = app_state.companies().list().await?;
    Ok((StatusCode::OK, Json(companies)))
}

pub async fn create_company(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = app_state
        .companies()
        .create(with_org_defaults(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn update_company(
    State(app_state): State<AppState>,
    PathParam(company_id): PathParam<i64>,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = app_state.companies().update(company_id, payload).await?;
    Ok((StatusCode::OK, Json(company)))
}

/// Branches of the company are left in place.
pub async fn delete_company(
    State(app_state): State<AppState>,
    PathParam(company_id): PathParam<i64>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    app_state.companies().delete(company_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Company deleted".to_string(),
        }),
    ))
}
