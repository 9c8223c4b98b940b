use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// The request body could not be read as a question
    #[error("{0}")]
    MalformedBody(String),

    #[error("Question is required")]
    EmptyQuestion,

    #[error("AI_GATEWAY_API_KEY is not configured")]
    MissingApiKey,

    #[error("Service is busy. Please try again in a moment.")]
    Busy,

    #[error("AI gateway error: {0}")]
    Upstream(u16),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl AssistantError {
    pub fn status(&self) -> StatusCode {
        match self {
            AssistantError::EmptyQuestion => StatusCode::BAD_REQUEST,
            AssistantError::Busy => StatusCode::TOO_MANY_REQUESTS,
            AssistantError::MalformedBody(_)
            | AssistantError::MissingApiKey
            | AssistantError::Upstream(_)
            | AssistantError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("AI assistant error: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
