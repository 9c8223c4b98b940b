use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Profile, ProfileUpdate};

const PROFILE_COLUMNS: &str = "id, user_id, first_name, middle_name, last_name, address, \
    date_of_birth, gender, email, phone, avatar_url, created_at, updated_at";

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Apply the fields present in `update` to the profile owned by `user_id`
    pub async fn update(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles SET
                first_name = COALESCE($2, first_name),
                middle_name = COALESCE($3, middle_name),
                last_name = COALESCE($4, last_name),
                address = COALESCE($5, address),
                date_of_birth = COALESCE($6, date_of_birth),
                gender = COALESCE($7, gender),
                phone = COALESCE($8, phone),
                avatar_url = COALESCE($9, avatar_url),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.middle_name)
        .bind(&update.last_name)
        .bind(&update.address)
        .bind(update.date_of_birth)
        .bind(&update.gender)
        .bind(&update.phone)
        .bind(&update.avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
