//! Profile model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Personal details attached to an account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields captured at sign-up
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: String,
}
