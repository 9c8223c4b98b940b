//! Client-side session management for the portal
//!
//! A [`SessionManager`] drives sign-up, sign-in and sign-out against an
//! [`AuthBackend`] and publishes every state change through a process-wide
//! [`SessionStore`]. Anything that needs to know who is signed in subscribes
//! to the store instead of keeping its own copy.
//!
//! ```no_run
//! use session::{HttpAuthBackend, SessionManager, SessionStore};
//!
//! # async fn example() -> Result<(), session::SessionError> {
//! let store = SessionStore::new();
//! let manager = SessionManager::new(HttpAuthBackend::from_env(), store.clone());
//!
//! let mut changes = store.subscribe();
//! manager.sign_in("asha@example.com", "secret1").await?;
//! changes.changed().await.ok();
//! println!("{:?}", store.current());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod http;
pub mod manager;
pub mod store;

pub use backend::{AuthBackend, Identity, Profile, Role, SignUpOutcome, SignUpRequest, Tokens};
pub use error::SessionError;
pub use http::HttpAuthBackend;
pub use manager::SessionManager;
pub use store::{Session, SessionState, SessionStore};
