/// Configuration management for Forum Service
///
/// Everything is read from environment variables (a `.env` file is honoured
/// by the binary before this runs). Production deployments must provide the
/// secrets explicitly; development falls back to local defaults.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Post cache (Redis) configuration
    pub cache: CacheConfig,
    /// Bearer token validation
    pub auth: AuthConfig,
    /// Feed pagination limits
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

/// Post cache configuration. The cache is disabled when no URL is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub url: Option<String>,
    /// A post is cached once its score reaches this value after a vote
    pub score_threshold: i64,
}

/// Bearer token validation
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret used to verify access tokens
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// Feed pagination limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 2,
            max_page_size: 50,
        }
    }
}

const DEV_JWT_SECRET: &str = "forum-dev-secret-change-me";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("FORUM_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("FORUM_SERVICE_PORT", 8080)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/forum".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DB_MIN_CONNECTIONS", 2)?,
                connect_timeout_secs: parse_env_or_default("DB_CONNECT_TIMEOUT_SECS", 5)?,
                acquire_timeout_secs: parse_env_or_default("DB_ACQUIRE_TIMEOUT_SECS", 10)?,
                idle_timeout_secs: parse_env_or_default("DB_IDLE_TIMEOUT_SECS", 600)?,
                max_lifetime_secs: parse_env_or_default("DB_MAX_LIFETIME_SECS", 1800)?,
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                score_threshold: parse_env_or_default("POST_CACHE_SCORE_THRESHOLD", 1)?,
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(secret) if !secret.trim().is_empty() => secret,
                    _ if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => DEV_JWT_SECRET.to_string(),
                };
                AuthConfig { jwt_secret }
            },
            feed: {
                let feed = FeedConfig {
                    default_page_size: parse_env_or_default("FEED_DEFAULT_PAGE_SIZE", 2)?,
                    max_page_size: parse_env_or_default("FEED_MAX_PAGE_SIZE", 50)?,
                };
                if feed.default_page_size < 1 || feed.default_page_size > feed.max_page_size {
                    return Err(format!(
                        "FEED_DEFAULT_PAGE_SIZE must be between 1 and {}",
                        feed.max_page_size
                    ));
                }
                feed
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APP_ENV",
            "FORUM_SERVICE_PORT",
            "CORS_ALLOWED_ORIGINS",
            "JWT_SECRET",
            "REDIS_URL",
            "POST_CACHE_SCORE_THRESHOLD",
            "FEED_DEFAULT_PAGE_SIZE",
            "FEED_MAX_PAGE_SIZE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn development_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.cors.allowed_origins, "http://localhost:3000");
        assert!(config.cache.url.is_none());
        assert_eq!(config.cache.score_threshold, 1);
        assert_eq!(config.feed.default_page_size, 2);
        assert!(!config.auth.jwt_secret.is_empty());
    }

    #[test]
    #[serial]
    fn production_requires_secrets() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://forum.example");
        assert!(Config::from_env().unwrap_err().contains("JWT_SECRET"));

        std::env::set_var("JWT_SECRET", "s3cret");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().unwrap_err().contains("CORS_ALLOWED_ORIGINS"));

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://forum.example");
        assert!(Config::from_env().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_unparseable_numbers() {
        clear_env();
        std::env::set_var("FORUM_SERVICE_PORT", "eighty");
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("FORUM_SERVICE_PORT"));
        clear_env();
    }

    #[test]
    #[serial]
    fn page_size_must_fit_maximum() {
        clear_env();
        std::env::set_var("FEED_DEFAULT_PAGE_SIZE", "100");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let auth = AuthConfig {
            jwt_secret: "top-secret".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("top-secret"));
    }
}
