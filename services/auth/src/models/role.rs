//! Account role

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role tag attached to every account
///
/// The role is informational for clients; it is carried in access tokens but
/// no capability matrix is enforced against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    #[default]
    Citizen,
    Employee,
    Admin,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Citizen => "citizen",
            AppRole::Employee => "employee",
            AppRole::Admin => "admin",
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
