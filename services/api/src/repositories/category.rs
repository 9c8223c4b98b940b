use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ComplaintCategory;

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<ComplaintCategory>> {
        let categories = sqlx::query_as::<_, ComplaintCategory>(
            "SELECT id, name, description, icon, subcategories \
             FROM complaint_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<ComplaintCategory>> {
        let category = sqlx::query_as::<_, ComplaintCategory>(
            "SELECT id, name, description, icon, subcategories \
             FROM complaint_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }
}
