use thiserror::Error;

/// Errors raised while talking to the auth service
#[derive(Debug, Error)]
pub enum SessionError {
    /// The auth service refused the request; the message is shown as-is
    #[error("{0}")]
    Rejected(String),

    #[error("Auth service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from auth service: {0}")]
    UnexpectedResponse(String),

    #[error("Not signed in")]
    NotAuthenticated,
}
