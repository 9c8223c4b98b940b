use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{
        HeaderValue, StatusCode,
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
    },
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{AppState, error::AssistantError};

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub fn create_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ai-assistant", post(ask).options(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(state)
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "assistant-service"
    }))
}

/// CORS preflight; never looks at the body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AssistantError> {
    let Json(payload) = payload.map_err(|e| AssistantError::MalformedBody(e.body_text()))?;

    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AssistantError::EmptyQuestion);
    }

    let answer = state.gateway.ask(question, payload.topic.as_deref()).await?;
    Ok(Json(AskResponse { answer }))
}
