//! Event and registration repository

use chrono::NaiveDate;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::{Event, EventRegistration, RegisteredEvent};

/// Name of the unique constraint allowing one registration per user and event
pub const REGISTRATIONS_USER_EVENT_KEY: &str = "event_registrations_user_event_key";

const EVENT_COLUMNS: &str = "id, name, organizer, venue, date, category, description, \
    poster_url, max_participants, is_approved, created_by, created_at, updated_at";

/// Validated event proposal ready to be stored
#[derive(Debug, Clone)]
pub struct EventInsert<'a> {
    pub name: &'a str,
    pub organizer: &'a str,
    pub venue: &'a str,
    pub date: NaiveDate,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub poster_url: Option<&'a str>,
    pub max_participants: Option<i32>,
}

/// Event repository
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an event proposed by `user_id`; it waits for approval
    pub async fn create(&self, user_id: Uuid, event: &EventInsert<'_>) -> DatabaseResult<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events
                (name, organizer, venue, date, category, description, poster_url,
                 max_participants, is_approved, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.name)
        .bind(event.organizer)
        .bind(event.venue)
        .bind(event.date)
        .bind(event.category)
        .bind(event.description)
        .bind(event.poster_url)
        .bind(event.max_participants)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Approved events, soonest first
    pub async fn list_approved(&self) -> DatabaseResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE is_approved ORDER BY date ASC, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events proposed by `user_id`, approved or not, soonest first
    pub async fn list_created_by(&self, user_id: Uuid) -> DatabaseResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE created_by = $1 ORDER BY date ASC, name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Register `user_id` for an approved event
    ///
    /// Returns `None` when no approved event has that id. A second
    /// registration fails with a uniqueness violation on
    /// [`REGISTRATIONS_USER_EVENT_KEY`].
    pub async fn register(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> DatabaseResult<Option<EventRegistration>> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            INSERT INTO event_registrations (event_id, user_id, status)
            SELECT id, $2, 'registered' FROM events WHERE id = $1 AND is_approved
            RETURNING id, event_id, user_id, status, created_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Delete the caller's registration; true if one existed
    pub async fn cancel_registration(&self, user_id: Uuid, event_id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("DELETE FROM event_registrations WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Registrations of `user_id` with their events, most recent first
    pub async fn list_registrations(&self, user_id: Uuid) -> DatabaseResult<Vec<RegisteredEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id AS registration_id, r.status, r.created_at AS registered_at,
                   e.id, e.name, e.organizer, e.venue, e.date, e.category, e.description,
                   e.poster_url, e.max_participants, e.is_approved, e.created_by,
                   e.created_at, e.updated_at
            FROM event_registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let registrations = rows.iter().map(registered_event).collect();

        Ok(registrations)
    }
}

fn registered_event(row: &PgRow) -> RegisteredEvent {
    RegisteredEvent {
        registration_id: row.get("registration_id"),
        status: row.get("status"),
        registered_at: row.get("registered_at"),
        event: Event {
            id: row.get("id"),
            name: row.get("name"),
            organizer: row.get("organizer"),
            venue: row.get("venue"),
            date: row.get("date"),
            category: row.get("category"),
            description: row.get("description"),
            poster_url: row.get("poster_url"),
            max_participants: row.get("max_participants"),
            is_approved: row.get("is_approved"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
    }
}
