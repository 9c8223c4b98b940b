//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::error;
use uuid::Uuid;

use crate::{AppState, jwt::TokenType, routes::AuthError};

/// Identity attached to a request that carried a valid access token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    /// The raw bearer token, kept so sign-out can revoke it
    pub token: String,
    /// Seconds until the token would have expired on its own
    pub remaining_lifetime: u64,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&req)
        .ok_or(AuthError::Unauthorized)?
        .to_string();

    let claims = state.jwt_service.validate_token(&token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        AuthError::Unauthorized
    })?;

    if claims.token_type != TokenType::Access {
        return Err(AuthError::Unauthorized);
    }

    let is_revoked = state.session_cache.is_revoked(&token).await.map_err(|e| {
        error!("Failed to check token revocation: {}", e);
        AuthError::InternalServerError
    })?;

    if is_revoked {
        return Err(AuthError::Unauthorized);
    }

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        remaining_lifetime: claims.remaining_lifetime(),
        token,
    });

    Ok(next.run(req).await)
}
