//! Authentication service models

pub mod profile;
pub mod role;
pub mod user;

// Re-export for convenience
pub use profile::{NewProfile, Profile};
pub use role::AppRole;
pub use user::{NewUser, User};
