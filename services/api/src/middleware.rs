//! Authentication middleware for JWT token validation
//!
//! The API service only holds the auth service's public key. Access tokens
//! are verified locally and checked against the shared revocation list.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::ApiError, models::AppRole, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    /// Absent when the role could not be looked up at sign-in
    pub role: Option<AppRole>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Option<AppRole>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Some(AppRole::Admin)
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Public key for verifying tokens
    pub public_key: String,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to the public key file
    pub fn from_env() -> anyhow::Result<Self> {
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        // If the public key looks like a file path, read from file (try CWD, then project root)
        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Ok(JwtConfig { public_key })
    }
}

/// Verifies RS256 access tokens issued by the auth service
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtVerifier {
            decoding_key,
            validation,
        })
    }

    /// Claims of a valid, unexpired access token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!("Failed to validate token: {}", e);
                ApiError::Unauthorized
            })?
            .claims;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized);
        }

        Ok(claims)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;
    let token = bearer.token();

    let claims = state.jwt_verifier.verify_access_token(token)?;

    let is_revoked = state.session_cache.is_revoked(token).await.map_err(|e| {
        error!("Failed to check token revocation: {}", e);
        ApiError::InternalServerError
    })?;

    if is_revoked {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_public_key_from_env() {
        unsafe { std::env::remove_var("JWT_PUBLIC_KEY") };
        assert!(JwtConfig::from_env().is_err());

        unsafe { std::env::set_var("JWT_PUBLIC_KEY", "../../fixtures/jwt/jwt_test_public.pem") };
        let config = JwtConfig::from_env().unwrap();
        assert!(config.public_key.starts_with("-----BEGIN"));
        assert!(JwtVerifier::new(&config).is_ok());

        unsafe { std::env::remove_var("JWT_PUBLIC_KEY") };
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let verifier = JwtVerifier::new(&JwtConfig {
            public_key: include_str!("../../../fixtures/jwt/jwt_test_public.pem").to_string(),
        })
        .unwrap();
        assert!(matches!(
            verifier.verify_access_token("not-a-jwt"),
            Err(ApiError::Unauthorized)
        ));
    }
}
