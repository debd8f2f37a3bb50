//! API Error Handling
//!
//! Unified error type and conversions for API responses. Status mapping:
//! 400 malformed input, 403 quota rejection, 404 unknown record, 409
//! invalid lifecycle transition, 500 persistence failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::chore::ChoreError;
use crate::service::crew::CrewError;
use crate::service::user::UserError;
use crate::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "persistence failure".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ChoreError> for ApiError {
    fn from(err: ChoreError) -> Self {
        match err {
            ChoreError::NotFound(id) => ApiError::NotFound(format!("chore {} not found", id)),
            ChoreError::InvalidState(msg) => ApiError::Conflict(msg),
            ChoreError::QuotaExceeded(msg) => ApiError::Forbidden(msg),
            ChoreError::ValidationError(msg) => ApiError::BadRequest(msg),
            ChoreError::StoreError(err) => ApiError::StoreError(err),
        }
    }
}

impl From<CrewError> for ApiError {
    fn from(err: CrewError) -> Self {
        match err {
            CrewError::NotFound(name) => ApiError::NotFound(format!("sailor {} not found", name)),
            CrewError::ValidationError(msg) => ApiError::BadRequest(msg),
            CrewError::StoreError(err) => ApiError::StoreError(err),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::ValidationError(msg) => ApiError::BadRequest(msg),
            UserError::StoreError(err) => ApiError::StoreError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
