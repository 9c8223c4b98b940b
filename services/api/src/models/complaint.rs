//! Complaint models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a complaint; staff move it forward outside this service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "complaint_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

/// Complaint row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub subcategory: String,
    pub title: String,
    pub description: Option<String>,
    pub address: String,
    pub zone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub reason: Vec<String>,
    pub status: ComplaintStatus,
    pub assigned_employee_id: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Complaint form as submitted by a citizen
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComplaint {
    pub category_id: Option<Uuid>,
    pub subcategory: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    pub zone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub reason: Vec<String>,
}
