//! Session state machine

use tracing::{info, warn};

use crate::{
    backend::{AuthBackend, SignUpOutcome, SignUpRequest, Tokens},
    error::SessionError,
    store::{Session, SessionState, SessionStore},
};

/// Drives the session lifecycle and publishes it through a [`SessionStore`]
///
/// `Anonymous -> Authenticating -> Authenticated | Error`, and back to
/// `Anonymous` on sign-out.
pub struct SessionManager<B> {
    backend: B,
    store: SessionStore,
}

impl<B: AuthBackend> SessionManager<B> {
    pub fn new(backend: B, store: SessionStore) -> Self {
        SessionManager { backend, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Sign in with email and password
    ///
    /// A rejection is published as [`SessionState::Error`] carrying the auth
    /// service's message unchanged, and returned to the caller.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), SessionError> {
        self.store.set(SessionState::Authenticating);

        match self.backend.sign_in(email, password).await {
            Ok(tokens) => {
                self.establish(tokens).await;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Register a new account
    ///
    /// When the address still needs confirming the store returns to
    /// `Anonymous` and the caller gets [`SignUpOutcome::VerificationRequired`].
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, SessionError> {
        self.store.set(SessionState::Authenticating);

        match self.backend.sign_up(request).await {
            Ok(SignUpOutcome::SignedIn(tokens)) => {
                self.establish(tokens.clone()).await;
                Ok(SignUpOutcome::SignedIn(tokens))
            }
            Ok(outcome) => {
                self.store.teardown();
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Exchange the refresh token for a fresh pair
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let refresh_token = self
            .store
            .current()
            .session()
            .map(|session| session.tokens.refresh_token.clone())
            .ok_or(SessionError::NotAuthenticated)?;

        match self.backend.refresh(&refresh_token).await {
            Ok(tokens) => {
                self.apply_session(Some(tokens)).await;
                Ok(())
            }
            Err(e) => {
                warn!("Session refresh rejected: {}", e);
                self.store.teardown();
                Err(e)
            }
        }
    }

    /// Sign out; the local session is cleared even if the auth service
    /// cannot be reached
    pub async fn sign_out(&self) {
        if let Some(token) = self.store.access_token() {
            if let Err(e) = self.backend.sign_out(&token).await {
                warn!("Failed to revoke session: {}", e);
            }
        }
        self.store.teardown();
        info!("Signed out");
    }

    /// React to a session change reported from outside, such as tokens
    /// restored from storage. `None` means the session is gone.
    pub async fn apply_session(&self, tokens: Option<Tokens>) {
        match tokens {
            Some(tokens) => self.establish(tokens).await,
            None => self.store.teardown(),
        }
    }

    async fn establish(&self, tokens: Tokens) {
        let user_id = tokens.user_id;
        let previous = self.store.current();
        let mut session = Session::from_tokens(tokens);
        // Keep display data from the same account while it is re-fetched
        if let Some(old) = previous.session().filter(|old| old.user_id == user_id) {
            session.profile = old.profile.clone();
            session.role = old.role;
        }
        let access_token = session.tokens.access_token.clone();
        self.store.set(SessionState::Authenticated(session));
        info!("Signed in as {}", user_id);

        match self.backend.fetch_identity(&access_token).await {
            Ok(identity) => self.store.update_session(user_id, |session| {
                session.profile = identity.profile;
                session.role = identity.role;
            }),
            Err(e) => warn!("Failed to load profile and role for {}: {}", user_id, e),
        }
    }

    fn fail(&self, error: SessionError) -> SessionError {
        warn!("Authentication failed: {}", error);
        self.store.set(SessionState::Error(error.to_string()));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Identity, IdentityUser, Profile, Role};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeBackend {
        sign_in_error: Option<String>,
        identity_error: bool,
        verification_required: bool,
        signed_out: Mutex<Vec<String>>,
        user_id: Uuid,
    }

    impl FakeBackend {
        fn tokens(&self, suffix: &str) -> Tokens {
            Tokens {
                user_id: self.user_id,
                email: "asha@example.com".to_string(),
                access_token: format!("access-{suffix}"),
                refresh_token: format!("refresh-{suffix}"),
                token_type: "Bearer".to_string(),
                expires_in: 900,
            }
        }
    }

    impl AuthBackend for FakeBackend {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Tokens, SessionError> {
            match &self.sign_in_error {
                Some(message) => Err(SessionError::Rejected(message.clone())),
                None => Ok(self.tokens("1")),
            }
        }

        async fn sign_up(&self, _request: &SignUpRequest) -> Result<SignUpOutcome, SessionError> {
            if self.verification_required {
                Ok(SignUpOutcome::VerificationRequired {
                    user_id: self.user_id,
                })
            } else {
                Ok(SignUpOutcome::SignedIn(self.tokens("1")))
            }
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<Tokens, SessionError> {
            Ok(self.tokens("2"))
        }

        async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
            self.signed_out.lock().unwrap().push(access_token.to_string());
            Ok(())
        }

        async fn fetch_identity(&self, _access_token: &str) -> Result<Identity, SessionError> {
            if self.identity_error {
                return Err(SessionError::UnexpectedResponse("503".to_string()));
            }
            Ok(Identity {
                user: IdentityUser {
                    id: self.user_id,
                    email: "asha@example.com".to_string(),
                    email_verified: true,
                },
                profile: Some(Profile {
                    first_name: Some("Asha".to_string()),
                    ..Profile::default()
                }),
                role: Some(Role::Citizen),
            })
        }
    }

    fn manager(backend: FakeBackend) -> SessionManager<FakeBackend> {
        SessionManager::new(backend, SessionStore::new())
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_and_role() {
        let manager = manager(FakeBackend::default());
        manager.sign_in("asha@example.com", "secret1").await.unwrap();

        let state = manager.store().current();
        let session = state.session().unwrap();
        assert_eq!(session.tokens.access_token, "access-1");
        assert_eq!(session.role, Some(Role::Citizen));
        assert_eq!(
            session.profile.as_ref().and_then(|p| p.first_name.as_deref()),
            Some("Asha")
        );
    }

    #[tokio::test]
    async fn test_rejection_message_is_passed_through_unchanged() {
        let manager = manager(FakeBackend {
            sign_in_error: Some("Email not confirmed".to_string()),
            ..FakeBackend::default()
        });

        let err = manager.sign_in("asha@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Email not confirmed");
        assert_eq!(
            manager.store().current(),
            SessionState::Error("Email not confirmed".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_identity_does_not_block_authentication() {
        let manager = manager(FakeBackend {
            identity_error: true,
            ..FakeBackend::default()
        });
        manager.sign_in("asha@example.com", "secret1").await.unwrap();

        let state = manager.store().current();
        let session = state.session().unwrap();
        assert!(session.profile.is_none());
        assert!(session.role.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_tears_down_and_notifies() {
        let manager = manager(FakeBackend::default());
        manager.sign_in("asha@example.com", "secret1").await.unwrap();

        let mut changes = manager.store().subscribe();
        changes.borrow_and_update();
        manager.sign_out().await;

        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), SessionState::Anonymous);
        assert_eq!(
            *manager.backend.signed_out.lock().unwrap(),
            vec!["access-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sign_up_awaiting_verification_stays_anonymous() {
        let manager = manager(FakeBackend {
            verification_required: true,
            ..FakeBackend::default()
        });

        let outcome = manager.sign_up(&SignUpRequest::default()).await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::VerificationRequired { .. }));
        assert_eq!(manager.store().current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens_and_keeps_display_data() {
        let manager = manager(FakeBackend::default());
        manager.sign_in("asha@example.com", "secret1").await.unwrap();
        manager.refresh().await.unwrap();

        let state = manager.store().current();
        let session = state.session().unwrap();
        assert_eq!(session.tokens.refresh_token, "refresh-2");
        assert_eq!(session.role, Some(Role::Citizen));
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let manager = manager(FakeBackend::default());
        assert!(matches!(
            manager.refresh().await,
            Err(SessionError::NotAuthenticated)
        ));
    }
}
