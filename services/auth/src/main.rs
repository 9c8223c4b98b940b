use anyhow::Result;
use common::{
    cache::{RedisConfig, SessionCache},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    settings::ServerConfig,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod jwt;
mod middleware;
mod models;
mod repositories;
mod routes;
mod validation;

use crate::{
    jwt::{JwtConfig, JwtService},
    repositories::UserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub jwt_service: JwtService,
    pub session_cache: SessionCache,
    /// New accounts must confirm their address before signing in
    pub require_email_verification: bool,
}

/// `AUTH_REQUIRE_EMAIL_VERIFICATION` is on unless set to `false` or `0`
fn require_email_verification() -> bool {
    std::env::var("AUTH_REQUIRE_EMAIL_VERIFICATION")
        .map(|value| !matches!(value.trim().to_lowercase().as_str(), "false" | "0"))
        .unwrap_or(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let session_cache = SessionCache::new(&RedisConfig::from_env()?).await?;

    let app_state = AppState {
        user_repository: UserRepository::new(pool),
        jwt_service,
        session_cache,
        require_email_verification: require_email_verification(),
    };

    if !app_state.require_email_verification {
        info!("Email verification is disabled; new accounts sign in immediately");
    }

    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env("AUTH", 3000)?;
    let addr = server.addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
