/// Forum Service Library
///
/// Community discussion backend: communities with subscriptions, posts with
/// threaded comments, up/down voting, paginated feeds and settings.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `routes`: route table shared by the binary and the HTTP tests
/// - `models`: rows and read models
/// - `services`: business logic (subscription gate, feed, settings)
/// - `vote`: vote state machine, storage seam and optimistic reducer
/// - `db`: pool, migrations and repositories
/// - `cache`: Redis post cache
/// - `middleware`: bearer-token authentication
/// - `error`: error types and HTTP mapping
/// - `config`: environment configuration
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod vote;

pub use config::Config;
pub use error::{AppError, Result};
