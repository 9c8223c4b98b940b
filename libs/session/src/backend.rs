//! The seam between the session manager and whatever issues sessions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

use crate::error::SessionError;

/// Tokens handed out by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tokens {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Citizen,
    Employee,
    Admin,
}

/// Display data about the signed-in person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// What `/auth/me` reports about the bearer of a token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Identity {
    pub user: IdentityUser,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
}

/// Registration form
#[derive(Debug, Clone, Default, Serialize)]
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
    pub role: Role,
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpOutcome {
    /// The account exists but the address has to be confirmed first
    VerificationRequired { user_id: Uuid },
    SignedIn(Tokens),
}

/// Issues and revokes sessions
pub trait AuthBackend: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Tokens, SessionError>> + Send;

    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<SignUpOutcome, SessionError>> + Send;

    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Tokens, SessionError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn fetch_identity(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Identity, SessionError>> + Send;
}
