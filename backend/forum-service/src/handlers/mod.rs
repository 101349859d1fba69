/// HTTP handlers for forum-service
///
/// - Communities: create, detail, subscribe/unsubscribe, search, trending
/// - Posts: feed, detail, create, vote
/// - Comments: threads, create, vote
/// - Settings: community and account administration
/// - Health: liveness/readiness probes
///
/// Handlers stay thin: parse and validate the request, build the service for
/// the call, and answer with plain-text `OK` (mutations) or JSON (reads).
pub mod comments;
pub mod communities;
pub mod health;
pub mod posts;
pub mod settings;

use crate::cache::PostCache;
use crate::config::{Config, FeedConfig};
use crate::services::PostService;
use actix_web::HttpResponse;
use sqlx::PgPool;

pub use comments::{create_comment, list_comments, vote_comment};
pub use communities::{
    community_detail, create_community, search_communities, subscribe, trending_communities,
    unsubscribe,
};
pub use health::{health_summary, liveness_check, readiness_summary, HealthState};
pub use posts::{create_post, get_feed, get_post, vote_post};
pub use settings::{
    delete_account, delete_community, remove_member, rename_community, rename_user,
};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct ForumState {
    pub cache: Option<PostCache>,
    pub cache_score_threshold: i64,
    pub feed: FeedConfig,
}

impl ForumState {
    pub fn new(config: &Config, cache: Option<PostCache>) -> Self {
        Self {
            cache,
            cache_score_threshold: config.cache.score_threshold,
            feed: config.feed.clone(),
        }
    }

    /// State without a cache, using default limits
    pub fn uncached() -> Self {
        Self {
            cache: None,
            cache_score_threshold: 1,
            feed: FeedConfig::default(),
        }
    }

    pub(crate) fn post_service(&self, pool: &PgPool) -> PostService {
        PostService::with_cache(pool.clone(), self.cache.clone(), self.cache_score_threshold)
    }
}

pub(crate) fn ok() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}
