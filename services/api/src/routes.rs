//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::{
        EmployeePhotoUpdate, NewComplaint, NewContactMessage, NewEncouragement, NewEvent,
        ProfileUpdate,
    },
    operations,
    state::AppState,
    storage::{MAX_IMAGE_BYTES, UploadFolder},
    zones,
};

/// Multipart framing allowance on top of the image itself
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router<()> {
    let upload_routes = Router::new()
        .route("/uploads/:folder", post(upload_image))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            MAX_IMAGE_BYTES + UPLOAD_OVERHEAD_BYTES,
        ));

    let protected_routes = Router::new()
        .route("/complaints", post(submit_complaint))
        .route("/complaints/mine", get(list_my_complaints))
        .route("/events", post(submit_event))
        .route("/events/mine", get(list_my_events))
        .route(
            "/events/:id/registration",
            post(register_for_event).delete(cancel_registration),
        )
        .route("/registrations/mine", get(list_my_registrations))
        .route("/encouragements", post(submit_encouragement))
        .route("/employees/:id/photo", put(update_employee_photo))
        .route("/profile", get(get_profile).put(update_profile))
        .merge(upload_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(list_categories))
        .route("/events", get(list_events))
        .route("/employees", get(list_employees))
        .route("/zones", get(list_zones))
        .route("/contact", post(submit_contact_message))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_categories(&state).await?))
}

pub async fn submit_complaint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<NewComplaint>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let complaint = operations::submit_complaint(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn list_my_complaints(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_my_complaints(&state, &user).await?))
}

pub async fn submit_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<NewEvent>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let event = operations::submit_event(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_events(&state).await?))
}

pub async fn list_my_events(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_my_events(&state, &user).await?))
}

pub async fn register_for_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(event_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = operations::register_for_event(&state, &user, event_id).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(event_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    operations::cancel_registration(&state, &user, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_my_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_my_registrations(&state, &user).await?))
}

pub async fn list_employees(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::list_employees(&state).await?))
}

pub async fn submit_encouragement(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<NewEncouragement>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = operations::submit_encouragement(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(employee_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<EmployeePhotoUpdate>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        operations::update_employee_photo(&state, &user, employee_id, payload).await?,
    ))
}

pub async fn submit_contact_message(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NewContactMessage>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let message = operations::submit_contact_message(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::get_profile(&state, &user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<ProfileUpdate>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(operations::update_profile(&state, &user, payload).await?))
}

#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    pub day: Option<String>,
}

pub async fn list_zones(Query(query): Query<ZoneQuery>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(zones::zones(query.day.as_deref())?))
}

fn bad_upload(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Validation("Image must be smaller than 5MB".to_string())
    } else {
        ApiError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Store the multipart `file` field and return its public URL
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(folder), _): WithRejection<Path<String>, ApiError>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let folder = UploadFolder::from_path(&folder)
        .ok_or_else(|| ApiError::NotFound("Unknown upload folder".to_string()))?;

    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(bad_upload)?;

        let url = state
            .storage
            .upload(folder, user.id, content_type.as_deref(), bytes.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(json!({ "url": url }))));
    }

    Err(ApiError::Validation("No file was uploaded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        middleware::{Claims, TokenType},
        state::tests::offline_state,
    };
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use tower::ServiceExt;

    fn signed_token(token_type: TokenType) -> String {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
            role: None,
            iat: now,
            exp: now + 600,
            token_type,
        };
        let key = EncodingKey::from_rsa_pem(include_bytes!(
            "../../../fixtures/jwt/jwt_test_private.pem"
        ))
        .unwrap();
        encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = create_router(offline_state().await);
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "api-service");
    }

    #[tokio::test]
    async fn test_zones_are_public() {
        let request = Request::get("/zones?day=Monday").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 10);
        assert_eq!(body[0]["schedule"][0]["type"], "wet");

        let request = Request::get("/zones?day=Funday").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown day: Funday");
    }

    #[tokio::test]
    async fn test_complaints_require_login() {
        let request = Request::post("/complaints")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Login required");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_accepted() {
        let request = Request::get("/profile")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", signed_token(TokenType::Refresh)),
            )
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_uploads_require_login() {
        let request = Request::post("/uploads/complaint-images")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .body(Body::from("--x--\r\n"))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_contact_validation_happens_before_storage() {
        let request = Request::post("/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"name": "Asha", "email": "", "message": "Bins overflowing"}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email is required");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let request = Request::post("/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"name": 5, "email": "a@b.in"}).to_string()))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

        let request = Request::post("/contact").body(Body::from("{}")).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
