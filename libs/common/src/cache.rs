//! Redis-backed session cache
//!
//! The auth service keeps the current refresh token of every signed-in account
//! here, and both the auth and API services consult the revocation list when
//! they validate a bearer token.

use anyhow::Result;
use redis::{AsyncCommands, Client};
use tracing::info;
use uuid::Uuid;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

fn revoked_key(token: &str) -> String {
    format!("revoked_token:{}", token)
}

/// Session and token-revocation store
#[derive(Clone)]
pub struct SessionCache {
    client: Client,
}

impl SessionCache {
    /// Open a client for the configured Redis instance
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(SessionCache { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Remember the refresh token currently issued to a user
    pub async fn store_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        ttl_seconds: u64,
    ) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(session_key(user_id), refresh_token, ttl_seconds)
            .await?;
        Ok(())
    }

    /// True when `refresh_token` is the one most recently issued to the user
    pub async fn refresh_token_matches(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let stored: Option<String> = conn.get(session_key(user_id)).await?;
        Ok(stored.as_deref() == Some(refresh_token))
    }

    /// Forget the user's session
    pub async fn drop_session(&self, user_id: Uuid) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: u64 = conn.del(session_key(user_id)).await?;
        Ok(())
    }

    /// Reject a token for the rest of its lifetime
    pub async fn revoke_token(&self, token: &str, ttl_seconds: u64) -> Result<()> {
        // SETEX refuses a zero TTL; an already expired token fails validation anyway
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(revoked_key(token), "1", ttl_seconds).await?;
        Ok(())
    }

    /// Check whether a token has been revoked
    pub async fn is_revoked(&self, token: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let revoked: bool = conn.exists(revoked_key(token)).await?;
        Ok(revoked)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
