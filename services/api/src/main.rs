use anyhow::Result;
use aws_config::BehaviorVersion;
use common::{
    cache::{RedisConfig, SessionCache},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    settings::ServerConfig,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod operations;
mod repositories;
mod routes;
mod state;
mod storage;
mod validation;
mod zones;

use crate::{
    middleware::{JwtConfig, JwtVerifier},
    state::AppState,
    storage::{ImageStorage, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_verifier = JwtVerifier::new(&JwtConfig::from_env()?)?;
    let session_cache = SessionCache::new(&RedisConfig::from_env()?).await?;

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let storage_config = StorageConfig::from_env();
    info!("Uploads go to bucket {}", storage_config.bucket);
    let storage = ImageStorage::new(aws_sdk_s3::Client::new(&aws_config), storage_config);

    let app_state = AppState::new(pool, jwt_verifier, session_cache, storage);
    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env("API", 3001)?;
    let addr = server.addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
