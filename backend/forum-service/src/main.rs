use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use forum_service::cache::PostCache;
use forum_service::handlers::{self, ForumState, HealthState};
use forum_service::middleware::{JwtAuthMiddleware, JwtKeys};
use forum_service::{db, metrics, routes, Config};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Connect the optional post cache; `None` when REDIS_URL is unset
async fn connect_cache(url: Option<&str>) -> anyhow::Result<Option<PostCache>> {
    let Some(url) = url else {
        tracing::warn!("REDIS_URL not set; post cache disabled");
        return Ok(None);
    };

    let client = redis::Client::open(url).context("invalid REDIS_URL")?;
    let manager = redis::aio::ConnectionManager::new(client)
        .await
        .context("failed to connect to Redis")?;

    tracing::info!("Post cache connected");
    Ok(Some(PostCache::new(manager)))
}

async fn healthcheck(port: u16) -> io::Result<()> {
    let url = format!("http://127.0.0.1:{}/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

/// Forum Service
///
/// # Routes
///
/// - `/api/posts/*` - feed, post detail, comment threads
/// - `/api/subreddit/*` - communities, membership, posting, commenting, voting
/// - `/api/search`, `/api/trending` - community discovery
/// - `/api/settings/*` - community and account administration
/// - `/health`, `/health/ready`, `/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Container healthchecks: `forum-service healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        let port = std::env::var("FORUM_SERVICE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        return healthcheck(port).await;
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting forum-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = match db::create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    db::run_migrations(&db_pool).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to run database migrations: {e}"),
        )
    })?;

    let cache = connect_cache(config.cache.url.as_deref())
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;

    let jwt_keys = Arc::new(JwtKeys::from_secret(&config.auth.jwt_secret));
    let forum_state = web::Data::new(ForumState::new(&config, cache.clone()));
    let health_state = web::Data::new(HealthState::new(db_pool.clone(), cache));
    let pool_data = web::Data::new(db_pool);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(forum_state.clone())
            .app_data(health_state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_keys.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/health", web::get().to(handlers::health_summary))
            .route("/health/ready", web::get().to(handlers::readiness_summary))
            .route("/health/live", web::get().to(handlers::liveness_check))
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            tracing::error!("HTTP server exited unexpectedly");
            return match result {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            };
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    server_handle.stop(true).await;
    if let Err(e) = server_task.await {
        tracing::error!("HTTP server task failed: {}", e);
    }

    tracing::info!("forum-service shut down");
    Ok(())
}
