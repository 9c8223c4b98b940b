//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    jwt::TokenType,
    middleware::{AuthContext, auth_middleware},
    models::{AppRole, NewProfile, NewUser, Profile, User},
    repositories::user::{USERS_EMAIL_KEY, hash_password, verify_password},
    validation::{SignUpFields, validate_email, validate_sign_up},
};

/// Response for token generation
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    #[serde(default)]
    pub role: AppRole,
}

/// Outcome of a registration
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResponse {
    /// The address must be confirmed before the first sign-in
    VerificationRequired { user_id: Uuid },
    /// Verification is disabled and the account is signed in right away
    SignedIn(TokenResponse),
}

/// Request for email verification
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Account summary returned by `/auth/me`
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
}

/// Identity of the signed-in caller
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub user: AccountResponse,
    pub profile: Option<Profile>,
    pub role: Option<AppRole>,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(sign_up))
        .route("/auth/verify", post(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

fn new_verification_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

/// Role lookup for token claims; a failure only costs the claim
async fn best_effort_role(state: &AppState, user_id: Uuid) -> Option<AppRole> {
    match state.user_repository.find_role(user_id).await {
        Ok(role) => role,
        Err(e) => {
            warn!("Failed to load role for user {}: {}", user_id, e);
            None
        }
    }
}

/// Mint an access/refresh pair and remember the refresh token
async fn issue_tokens(state: &AppState, user: &User) -> Result<TokenResponse, AuthError> {
    let role = best_effort_role(state, user.id).await;

    let access_token = state
        .jwt_service
        .generate_access_token(user, role)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let refresh_token = state.jwt_service.generate_refresh_token(user).map_err(|e| {
        error!("Failed to generate refresh token: {}", e);
        AuthError::InternalServerError
    })?;

    state
        .session_cache
        .store_refresh_token(
            user.id,
            &refresh_token,
            state.jwt_service.refresh_token_expiry(),
        )
        .await
        .map_err(|e| {
            error!("Failed to store session in Redis: {}", e);
            AuthError::InternalServerError
        })?;

    Ok(TokenResponse {
        user_id: user.id,
        email: user.email.clone(),
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    })
}

/// User registration endpoint
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = payload.email.trim().to_lowercase();

    validate_sign_up(&SignUpFields {
        email: &email,
        password: &payload.password,
        confirm_password: &payload.confirm_password,
        first_name: &payload.first_name,
        last_name: &payload.last_name,
        address: &payload.address,
    })
    .map_err(AuthError::Validation)?;

    if payload.role == AppRole::Admin {
        return Err(AuthError::Validation(
            "Administrator accounts cannot be self-registered".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("{}", e);
        AuthError::InternalServerError
    })?;

    let verification_token = state
        .require_email_verification
        .then(new_verification_token);

    let new_user = NewUser {
        email: email.clone(),
        password_hash,
        verification_token: verification_token.clone(),
        profile: NewProfile {
            first_name: payload.first_name.trim().to_string(),
            middle_name: payload
                .middle_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            last_name: payload.last_name.trim().to_string(),
            address: payload.address.trim().to_string(),
            date_of_birth: payload.date_of_birth,
            gender: payload.gender.filter(|gender| !gender.is_empty()),
            email,
        },
        role: payload.role,
    };

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|e| match e {
            e if e.is_unique_violation_on(USERS_EMAIL_KEY) => AuthError::AlreadyRegistered,
            e => {
                error!("Failed to create user: {}", e);
                AuthError::InternalServerError
            }
        })?;

    info!("Registered user {} with role {}", user.id, payload.role);

    match verification_token {
        Some(token) => {
            info!(user_id = %user.id, "Email verification pending");
            debug!(user_id = %user.id, verification_token = %token, "Issued verification token");
            Ok((
                StatusCode::CREATED,
                Json(SignUpResponse::VerificationRequired { user_id: user.id }),
            ))
        }
        None => {
            let tokens = issue_tokens(&state, &user).await?;
            Ok((StatusCode::CREATED, Json(SignUpResponse::SignedIn(tokens))))
        }
    }
}

/// Email verification endpoint
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.token.trim().is_empty() {
        return Err(AuthError::InvalidVerificationToken);
    }

    let user = state
        .user_repository
        .verify_email(payload.token.trim())
        .await
        .map_err(|e| {
            error!("Failed to verify email: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::InvalidVerificationToken)?;

    info!("Email verified for user {}", user.id);

    Ok(Json(serde_json::json!({
        "message": "Email confirmed. You can now log in."
    })))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = payload.email.trim().to_lowercase();
    validate_email(&email).map_err(AuthError::Validation)?;
    if payload.password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_ok = verify_password(&user.password_hash, &payload.password).map_err(|e| {
        error!("{}", e);
        AuthError::InternalServerError
    })?;

    if !password_ok {
        info!("Rejected login for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    if state.require_email_verification && !user.is_verified() {
        return Err(AuthError::EmailNotConfirmed);
    }

    let tokens = issue_tokens(&state, &user).await?;
    info!("User {} logged in", user.id);

    Ok((StatusCode::OK, Json(tokens)))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    if claims.token_type != TokenType::Refresh {
        return Err(AuthError::Unauthorized);
    }

    // Only the most recently issued refresh token is honoured
    let is_current = state
        .session_cache
        .refresh_token_matches(claims.sub, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to read session from Redis: {}", e);
            AuthError::InternalServerError
        })?;

    if !is_current {
        return Err(AuthError::Unauthorized);
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    let tokens = issue_tokens(&state, &user).await?;

    Ok((StatusCode::OK, Json(tokens)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AuthError> {
    state
        .session_cache
        .revoke_token(&auth.token, auth.remaining_lifetime)
        .await
        .map_err(|e| {
            error!("Failed to revoke access token: {}", e);
            AuthError::InternalServerError
        })?;

    state
        .session_cache
        .drop_session(auth.user_id)
        .await
        .map_err(|e| {
            error!("Failed to remove session from Redis: {}", e);
            AuthError::InternalServerError
        })?;

    info!("User {} logged out", auth.user_id);

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Identity of the caller with best-effort profile and role
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .user_repository
        .find_by_id(auth.user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    let profile = state
        .user_repository
        .find_profile(user.id)
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to load profile for user {}: {}", user.id, e);
            None
        });
    let role = best_effort_role(&state, user.id).await;

    Ok(Json(IdentityResponse {
        user: AccountResponse {
            id: user.id,
            email: user.email.clone(),
            email_verified: user.is_verified(),
        },
        profile,
        role,
    }))
}

/// Custom error type for authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("User already registered")]
    AlreadyRegistered,
    #[error("Invalid or expired verification token")]
    InvalidVerificationToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Validation(_) | AuthError::InvalidVerificationToken => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotConfirmed => StatusCode::FORBIDDEN,
            AuthError::AlreadyRegistered => StatusCode::CONFLICT,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
