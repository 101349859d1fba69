/// Liveness and readiness probes
use crate::cache::PostCache;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;

pub struct HealthState {
    db_pool: PgPool,
    cache: Option<PostCache>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

impl HealthState {
    pub fn new(db_pool: PgPool, cache: Option<PostCache>) -> Self {
        Self { db_pool, cache }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn postgres_check(&self) -> ComponentCheck {
        let start = Instant::now();
        let result = self.check_postgres().await;
        let latency_ms = Some(start.elapsed().as_millis() as u64);

        match result {
            Ok(_) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms,
            },
        }
    }

    /// Redis only backs the post cache, so a failure degrades rather than fails
    async fn redis_check(&self) -> ComponentCheck {
        let Some(cache) = &self.cache else {
            return ComponentCheck {
                status: ComponentStatus::Degraded,
                message: "Post cache disabled (REDIS_URL not set)".to_string(),
                latency_ms: None,
            };
        };

        let start = Instant::now();
        let result = cache.ping().await;
        let latency_ms = Some(start.elapsed().as_millis() as u64);

        match result {
            Ok(_) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "Redis ping successful".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("Redis ping failed: {}", e),
                latency_ms,
            },
        }
    }
}

pub async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "forum-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "forum-service"
        })),
    }
}

pub async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    checks.insert("postgresql".to_string(), state.postgres_check().await);
    checks.insert("redis".to_string(), state.redis_check().await);

    let response = summarize(checks);
    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

/// Ready unless a component is unhealthy; the worst component sets the status
fn summarize(checks: HashMap<String, ComponentCheck>) -> ReadinessResponse {
    let worst = |s: ComponentStatus| checks.values().any(|c| c.status == s);

    let status = if worst(ComponentStatus::Unhealthy) {
        ComponentStatus::Unhealthy
    } else if worst(ComponentStatus::Degraded) {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    ReadinessResponse {
        ready: status != ComponentStatus::Unhealthy,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: ComponentStatus) -> ComponentCheck {
        ComponentCheck {
            status,
            message: String::new(),
            latency_ms: Some(1),
        }
    }

    #[test]
    fn degraded_cache_keeps_service_ready() {
        let mut checks = HashMap::new();
        checks.insert("postgresql".to_string(), check(ComponentStatus::Healthy));
        checks.insert("redis".to_string(), check(ComponentStatus::Degraded));

        let response = summarize(checks);
        assert!(response.ready);
        assert_eq!(response.status, ComponentStatus::Degraded);
    }

    #[test]
    fn unhealthy_database_is_not_ready() {
        let mut checks = HashMap::new();
        checks.insert("postgresql".to_string(), check(ComponentStatus::Unhealthy));
        checks.insert("redis".to_string(), check(ComponentStatus::Healthy));

        let response = summarize(checks);
        assert!(!response.ready);
        assert_eq!(response.status, ComponentStatus::Unhealthy);
    }

    #[actix_web::test]
    async fn liveness_always_answers() {
        let resp = liveness_check().await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    }
}
