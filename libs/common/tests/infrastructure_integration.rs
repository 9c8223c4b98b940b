//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL (with the portal schema applied) and
//! Redis are reachable from the application.

use common::{
    cache::{RedisConfig, SessionCache},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    // Reference categories are seeded by the schema migration
    let row = sqlx::query("SELECT COUNT(*) AS count FROM complaint_categories")
        .fetch_one(&pool)
        .await?;
    let count: i64 = row.get("count");
    assert!(count > 0, "complaint categories were not seeded");

    let redis_config = RedisConfig::from_env()?;
    let cache = SessionCache::new(&redis_config).await?;
    assert!(cache.health_check().await?, "Redis health check failed");

    Ok(())
}
