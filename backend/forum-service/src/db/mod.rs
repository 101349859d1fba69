/// Database access layer
///
/// - Connection pool creation and verification
/// - Embedded schema migrations
/// - Repository functions for users, communities, subscriptions, posts and
///   comments (vote storage lives in `crate::vote::store`)
pub mod comment_repo;
pub mod community_repo;
pub mod post_repo;
pub mod subscription_repo;
pub mod user_repo;

use crate::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{error, info};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Build the pool and verify it with `SELECT 1` within the connect timeout
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!("Database pool created and verified successfully");
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}
