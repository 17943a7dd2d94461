use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_ALREADY_MEMBER, ERR_GROUP_FULL, ERR_INTERNAL, ERR_STORAGE};

/// Failures of the JSON document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read collection '{collection}': {source}")]
    Read {
        collection: String,
        source: std::io::Error,
    },
    #[error("failed to write collection '{collection}': {source}")]
    Write {
        collection: String,
        source: std::io::Error,
    },
    #[error("collection '{collection}' holds malformed JSON: {source}")]
    Decode {
        collection: String,
        source: serde_json::Error,
    },
    #[error("failed to encode collection '{collection}': {source}")]
    Encode {
        collection: String,
        source: serde_json::Error,
    },
}

/// Errors surfaced at the request boundary as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{}", ERR_ALREADY_MEMBER)]
    AlreadyMember,
    #[error("{}", ERR_GROUP_FULL)]
    CapacityExceeded,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    /// Server-side failure other than storage; the detail is only logged.
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyMember | ApiError::CapacityExceeded | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor rejections are client errors; their text becomes the message.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                ERR_STORAGE.to_string()
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal failure");
                ERR_INTERNAL.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT '{0}': expected a number between 0 and 65535")]
    InvalidPort(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}
