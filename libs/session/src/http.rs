//! [`AuthBackend`] over HTTP against the auth service

use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::error;

use crate::{
    backend::{AuthBackend, Identity, SignUpOutcome, SignUpRequest, Tokens},
    error::SessionError,
};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to the `/auth/*` routes of the auth service
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpAuthBackend {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL from `AUTH_SERVICE_URL` (default: "http://localhost:3000")
    pub fn from_env() -> Self {
        let base_url = std::env::var("AUTH_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        Self::new(base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or turn the service's `{error}` into a rejection
async fn read<T: DeserializeOwned>(response: Response) -> Result<T, SessionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => Err(SessionError::Rejected(error)),
        Err(_) => {
            error!("Auth service answered {} with body {:?}", status, body);
            Err(SessionError::UnexpectedResponse(status.to_string()))
        }
    }
}

impl AuthBackend for HttpAuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Tokens, SessionError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        read(response).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, SessionError> {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(request)
            .send()
            .await?;
        read(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Tokens, SessionError> {
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        read(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
        let response = self
            .client
            .post(self.url("/auth/logout"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read::<serde_json::Value>(response).await.map(|_| ())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<Identity, SessionError> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read(response).await
    }
}
