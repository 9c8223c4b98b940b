//! Process-wide session store

use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::backend::{Profile, Role, Tokens};

/// A signed-in account
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub tokens: Tokens,
    /// Best-effort display data, `None` until (or unless) it could be loaded
    pub profile: Option<Profile>,
    pub role: Option<Role>,
}

impl Session {
    pub(crate) fn from_tokens(tokens: Tokens) -> Self {
        Session {
            user_id: tokens.user_id,
            email: tokens.email.clone(),
            tokens,
            profile: None,
            role: None,
        }
    }
}

/// Where the session lifecycle currently stands
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
    /// The last attempt was rejected; holds the message to display
    Error(String),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}

/// Shared holder of the current [`SessionState`]
///
/// Clones share the same state. Subscribers are woken on every change.
#[derive(Clone)]
pub struct SessionStore {
    sender: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::Anonymous);
        SessionStore {
            sender: Arc::new(sender),
        }
    }

    /// Receive every future state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    /// Snapshot of the current state
    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Access token of the signed-in account, if any
    pub fn access_token(&self) -> Option<String> {
        self.sender
            .borrow()
            .session()
            .map(|session| session.tokens.access_token.clone())
    }

    pub(crate) fn set(&self, state: SessionState) {
        self.sender.send_replace(state);
    }

    /// Apply `update` to the current session, if there still is one for `user_id`
    pub(crate) fn update_session(&self, user_id: Uuid, update: impl FnOnce(&mut Session)) {
        self.sender.send_if_modified(|state| match state {
            SessionState::Authenticated(session) if session.user_id == user_id => {
                update(session);
                true
            }
            _ => false,
        });
    }

    /// Forget the current session
    pub fn teardown(&self) {
        self.set(SessionState::Anonymous);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
