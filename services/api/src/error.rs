//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request carried no valid session
    #[error("Login required")]
    Unauthorized,

    /// Input rejected before anything was written
    #[error("{0}")]
    Validation(String),

    /// A complaint was submitted without its category or subcategory
    #[error("Please select a category and subcategory")]
    SelectionRequired,

    #[error("You have already registered for this event")]
    AlreadyRegistered,

    #[error("You have already encouraged this employee")]
    AlreadyEncouraged,

    #[error("You are not allowed to change this record")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// Object storage refused an upload
    #[error("Failed to upload image: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("{0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::SelectionRequired => StatusCode::BAD_REQUEST,
            ApiError::AlreadyRegistered | ApiError::AlreadyEncouraged => StatusCode::CONFLICT,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

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

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
