use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::POST_CACHE_EVENTS;
use crate::models::PostSummary;

const POST_TTL_SECS: i64 = 24 * 60 * 60;

/// Redis hash cache for popular posts (`post:{id}`)
#[derive(Clone)]
pub struct PostCache {
    redis: ConnectionManager,
}

/// The viewer-independent part of a post, as stored in Redis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPost {
    pub id: Uuid,
    pub title: String,
    pub author_username: Option<String>,
    pub community_name: String,
    pub content: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&PostSummary> for CachedPost {
    fn from(post: &PostSummary) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            author_username: post.author_username.clone(),
            community_name: post.community_name.clone(),
            content: post.content.clone(),
            created_at: post.created_at,
        }
    }
}

impl CachedPost {
    fn to_fields(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("id", self.id.to_string()),
            ("title", self.title.clone()),
            (
                "authorUsername",
                self.author_username.clone().unwrap_or_default(),
            ),
            ("communityName", self.community_name.clone()),
            ("content", serde_json::to_string(&self.content)?),
            ("createdAt", self.created_at.to_rfc3339()),
        ])
    }

    /// `None` when the hash is empty or incomplete
    fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let id = fields.get("id")?.parse().ok()?;
        let created_at = DateTime::parse_from_rfc3339(fields.get("createdAt")?)
            .ok()?
            .with_timezone(&Utc);
        let content = serde_json::from_str(fields.get("content")?).ok()?;
        let author_username = fields
            .get("authorUsername")
            .filter(|name| !name.is_empty())
            .cloned();

        Some(Self {
            id,
            title: fields.get("title")?.clone(),
            author_username,
            community_name: fields.get("communityName")?.clone(),
            content,
            created_at,
        })
    }
}

impl PostCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn post_key(post_id: Uuid) -> String {
        format!("post:{}", post_id)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<CachedPost>> {
        let key = Self::post_key(post_id);
        let mut conn = self.redis.clone();

        let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(|e| {
            warn!("Redis read error for post cache: {}", e);
            POST_CACHE_EVENTS.with_label_values(&["error"]).inc();
            AppError::Cache(e.to_string())
        })?;

        match CachedPost::from_fields(&fields) {
            Some(post) => {
                debug!(%post_id, "post cache HIT");
                POST_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                Ok(Some(post))
            }
            None => {
                debug!(%post_id, "post cache MISS");
                POST_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                Ok(None)
            }
        }
    }

    pub async fn cache_post(&self, post: &CachedPost) -> Result<()> {
        let key = Self::post_key(post.id);
        let fields = post.to_fields()?;
        let mut conn = self.redis.clone();

        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &fields)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(POST_TTL_SECS)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| {
                warn!("Failed to write post cache: {}", e);
                POST_CACHE_EVENTS.with_label_values(&["error"]).inc();
                AppError::Cache(e.to_string())
            })?;

        POST_CACHE_EVENTS.with_label_values(&["write"]).inc();
        Ok(())
    }

    pub async fn invalidate_posts(&self, post_ids: &[Uuid]) -> Result<()> {
        if post_ids.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = post_ids.iter().map(|id| Self::post_key(*id)).collect();
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&keys).await.map_err(|e| {
            warn!("Failed to invalidate post cache: {}", e);
            POST_CACHE_EVENTS.with_label_values(&["error"]).inc();
            AppError::Cache(e.to_string())
        })?;

        POST_CACHE_EVENTS
            .with_label_values(&["invalidate"])
            .inc_by(keys.len() as u64);
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Cache(format!("unexpected PING response: {}", pong)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CachedPost {
        CachedPost {
            id: Uuid::new_v4(),
            title: "Rust 2024 edition".to_string(),
            author_username: Some("ferris".to_string()),
            community_name: "rust".to_string(),
            content: Some(serde_json::json!({"blocks": [{"type": "paragraph"}]})),
            created_at: Utc::now(),
        }
    }

    fn as_map(post: &CachedPost) -> HashMap<String, String> {
        post.to_fields()
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn hash_fields_restore_post() {
        let post = sample();
        let restored = CachedPost::from_fields(&as_map(&post)).unwrap();
        assert_eq!(restored.id, post.id);
        assert_eq!(restored.content, post.content);
        assert_eq!(restored.author_username.as_deref(), Some("ferris"));
    }

    #[test]
    fn empty_or_partial_hash_is_a_miss() {
        assert!(CachedPost::from_fields(&HashMap::new()).is_none());

        let mut fields = as_map(&sample());
        fields.remove("title");
        assert!(CachedPost::from_fields(&fields).is_none());
    }
}
