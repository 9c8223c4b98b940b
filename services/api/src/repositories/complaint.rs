//! Complaint repository for database operations

use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Complaint;

/// Name of the foreign key from complaints to their category
pub const COMPLAINTS_CATEGORY_FKEY: &str = "complaints_category_id_fkey";

const COMPLAINT_COLUMNS: &str = "id, user_id, category_id, subcategory, title, description, \
    address, zone, latitude, longitude, photo_url, reason, status, assigned_employee_id, \
    resolved_at, created_at, updated_at";

/// Validated complaint ready to be stored
#[derive(Debug, Clone)]
pub struct ComplaintInsert<'a> {
    pub category_id: Uuid,
    pub subcategory: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub address: &'a str,
    pub zone: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<&'a str>,
    pub reason: &'a [String],
}

/// Complaint repository
#[derive(Clone)]
pub struct ComplaintRepository {
    pool: PgPool,
}

impl ComplaintRepository {
    /// Create a new complaint repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a complaint owned by `user_id`; the status starts as pending
    pub async fn create(
        &self,
        user_id: Uuid,
        complaint: &ComplaintInsert<'_>,
    ) -> DatabaseResult<Complaint> {
        let complaint = sqlx::query_as::<_, Complaint>(&format!(
            r#"
            INSERT INTO complaints
                (user_id, category_id, subcategory, title, description, address, zone,
                 latitude, longitude, photo_url, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(complaint.category_id)
        .bind(complaint.subcategory)
        .bind(complaint.title)
        .bind(complaint.description)
        .bind(complaint.address)
        .bind(complaint.zone)
        .bind(complaint.latitude)
        .bind(complaint.longitude)
        .bind(complaint.photo_url)
        .bind(complaint.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(complaint)
    }

    /// Complaints owned by `user_id`, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Complaint>> {
        let complaints = sqlx::query_as::<_, Complaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(complaints)
    }
}
