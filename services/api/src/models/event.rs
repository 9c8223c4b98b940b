//! Event and registration models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Community event
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub organizer: String,
    pub venue: String,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub max_participants: Option<i32>,
    /// Set by staff; only approved events are listed publicly
    pub is_approved: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event proposal form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub venue: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub max_participants: Option<i32>,
}

/// Registration row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Registration joined with the event it is for
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredEvent {
    pub registration_id: Uuid,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub event: Event,
}
