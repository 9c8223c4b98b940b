//! User repository for database operations
//!
//! Owns the `users`, `profiles` and `user_roles` tables.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{AppRole, NewUser, Profile, User};

/// Name of the unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

const USER_COLUMNS: &str = "id, email, password_hash, email_verified_at, created_at, updated_at";

/// Hash a password with Argon2 and a random salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(password_hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the account, its profile and its role in one transaction
    ///
    /// A duplicate email surfaces as [`DatabaseError::UniqueViolation`] on
    /// [`USERS_EMAIL_KEY`].
    pub async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user with role {}", new_user.role);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, verification_token, email_verified_at)
            VALUES ($1, $2, $3, CASE WHEN $3::TEXT IS NULL THEN NOW() END)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.verification_token)
        .fetch_one(&mut *tx)
        .await?;

        let profile = &new_user.profile;
        sqlx::query(
            r#"
            INSERT INTO profiles
                (user_id, first_name, middle_name, last_name, address, date_of_birth, gender, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&profile.first_name)
        .bind(&profile.middle_name)
        .bind(&profile.last_name)
        .bind(&profile.address)
        .bind(profile.date_of_birth)
        .bind(&profile.gender)
        .bind(&profile.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user.id)
            .bind(new_user.role)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Consume a verification token and mark the address confirmed
    pub async fn verify_email(&self, token: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email_verified_at = NOW(), verification_token = NULL, updated_at = NOW()
            WHERE verification_token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Profile of a user, if one was created
    pub async fn find_profile(&self, user_id: Uuid) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, first_name, middle_name, last_name, address, date_of_birth,
                   gender, email, phone, avatar_url, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Role of a user, if one was assigned
    pub async fn find_role(&self, user_id: Uuid) -> DatabaseResult<Option<AppRole>> {
        let role =
            sqlx::query_scalar::<_, AppRole>("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("swachh123").unwrap();
        assert_ne!(hash, "swachh123");
        assert!(verify_password(&hash, "swachh123").unwrap());
        assert!(!verify_password(&hash, "wrong-password").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "anything").is_err());
    }
}
