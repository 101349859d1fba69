/// Post service - creation, detail reads and the popular-post cache
use crate::cache::{CachedPost, PostCache};
use crate::db::{community_repo, post_repo};
use crate::error::{AppError, Result};
use crate::models::{Post, PostSummary};
use crate::services::CommunityService;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// A post as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PostDetail {
    /// Served from Redis; carries no vote data for the viewer
    Cached(CachedPost),
    Live(PostSummary),
}

pub struct PostService {
    pool: PgPool,
    cache: Option<PostCache>,
    cache_score_threshold: i64,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: None,
            cache_score_threshold: 1,
        }
    }

    pub fn with_cache(pool: PgPool, cache: Option<PostCache>, cache_score_threshold: i64) -> Self {
        Self {
            pool,
            cache,
            cache_score_threshold,
        }
    }

    /// Create a post; the author must be subscribed to the community
    pub async fn create_post(
        &self,
        author_id: Uuid,
        community_id: Uuid,
        title: &str,
        content: Option<&Value>,
    ) -> Result<Post> {
        if community_repo::find_by_id(&self.pool, community_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Subreddit not found".to_string()));
        }

        CommunityService::new(self.pool.clone())
            .ensure_subscribed(author_id, community_id)
            .await?;

        let post = post_repo::create_post(&self.pool, author_id, community_id, title, content)
            .await?;

        tracing::info!(
            post_id = %post.id,
            author_id = %author_id,
            community_id = %community_id,
            "post created"
        );

        Ok(post)
    }

    /// Cache first, database fallback
    pub async fn get_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<PostDetail> {
        if let Some(cache) = &self.cache {
            match cache.get_post(post_id).await {
                Ok(Some(cached)) => return Ok(PostDetail::Cached(cached)),
                Ok(None) => {}
                Err(err) => tracing::debug!(%post_id, "post cache read failed: {}", err),
            }
        }

        post_repo::find_summary(&self.pool, post_id, viewer_id)
            .await?
            .map(PostDetail::Live)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }

    /// Cache the post once its score reaches the threshold. Never fails the caller.
    pub async fn refresh_cache_after_vote(&self, post_id: Uuid, score: i64) {
        let Some(cache) = &self.cache else {
            return;
        };
        if score < self.cache_score_threshold {
            return;
        }

        let post = match post_repo::find_summary(&self.pool, post_id, None).await {
            Ok(Some(post)) => post,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%post_id, "could not load post for caching: {}", err);
                return;
            }
        };

        if let Err(err) = cache.cache_post(&CachedPost::from(&post)).await {
            tracing::warn!(%post_id, "post cache set failed: {}", err);
        } else {
            tracing::debug!(%post_id, score, "popular post cached");
        }
    }

    /// Drop cached copies; failures are logged only
    pub async fn invalidate(&self, post_ids: &[Uuid]) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.invalidate_posts(post_ids).await {
                tracing::warn!(count = post_ids.len(), "post cache invalidation failed: {}", err);
            }
        }
    }
}
