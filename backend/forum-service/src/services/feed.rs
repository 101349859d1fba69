/// Feed paginator
///
/// Offset pagination over posts, scoped to one community, to the viewer's
/// subscriptions, or to everything.
use crate::config::FeedConfig;
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::metrics::FEED_REQUEST_TOTAL;
use crate::models::PostSummary;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    /// Newest first
    #[default]
    New,
    /// Net score, then comment count, then recency
    Top,
}

impl FeedSort {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedSort::New => "new",
            FeedSort::Top => "top",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Posts of the community with this name
    Community(String),
    /// Posts of every community the user is subscribed to
    Subscribed(Uuid),
    All,
}

impl FeedScope {
    /// An explicit community wins, then the viewer's subscriptions
    pub fn resolve(community_name: Option<&str>, viewer_id: Option<Uuid>) -> Self {
        match (community_name, viewer_id) {
            (Some(name), _) => FeedScope::Community(name.to_string()),
            (None, Some(user_id)) => FeedScope::Subscribed(user_id),
            (None, None) => FeedScope::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedScope::Community(_) => "community",
            FeedScope::Subscribed(_) => "subscribed",
            FeedScope::All => "all",
        }
    }
}

/// `GET /api/posts` query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub subreddit_name: Option<String>,
    #[serde(default)]
    pub sort: FeedSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl FeedQuery {
    /// Validate `page`/`limit` against the configured bounds
    pub fn window(&self, config: &FeedConfig) -> Result<PageWindow> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(config.default_page_size);

        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if limit < 1 || limit > config.max_page_size {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                config.max_page_size
            )));
        }

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;

        Ok(PageWindow { limit, offset })
    }

    fn community_name(&self) -> Option<&str> {
        self.subreddit_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

pub struct FeedService {
    pool: PgPool,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(pool: PgPool, config: FeedConfig) -> Self {
        Self { pool, config }
    }

    pub async fn page(&self, query: &FeedQuery, viewer_id: Option<Uuid>) -> Result<Vec<PostSummary>> {
        let window = query.window(&self.config)?;
        let scope = FeedScope::resolve(query.community_name(), viewer_id);

        FEED_REQUEST_TOTAL
            .with_label_values(&[scope.label(), query.sort.as_str()])
            .inc();

        let posts = post_repo::list_feed(
            &self.pool,
            viewer_id,
            &scope,
            query.sort,
            window.limit,
            window.offset,
        )
        .await?;

        tracing::debug!(
            scope = scope.label(),
            sort = query.sort.as_str(),
            limit = window.limit,
            offset = window.offset,
            returned = posts.len(),
            "feed page served"
        );

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, limit: Option<i64>) -> FeedQuery {
        FeedQuery {
            page,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let config = FeedConfig::default();
        assert_eq!(
            query(Some(1), Some(10)).window(&config).unwrap(),
            PageWindow { limit: 10, offset: 0 }
        );
        assert_eq!(
            query(Some(3), Some(10)).window(&config).unwrap(),
            PageWindow { limit: 10, offset: 20 }
        );
    }

    #[test]
    fn defaults_apply_when_absent() {
        let config = FeedConfig::default();
        let window = query(None, None).window(&config).unwrap();
        assert_eq!(window.limit, config.default_page_size);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let config = FeedConfig::default();
        for (page, limit) in [(0, 10), (-1, 10), (1, 0), (1, config.max_page_size + 1)] {
            let err = query(Some(page), Some(limit)).window(&config).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{} {}", page, limit);
        }
        assert!(query(Some(i64::MAX), Some(50)).window(&config).is_err());
    }

    #[test]
    fn scope_prefers_named_community() {
        let viewer = Uuid::new_v4();
        assert_eq!(
            FeedScope::resolve(Some("rust"), Some(viewer)),
            FeedScope::Community("rust".to_string())
        );
        assert_eq!(FeedScope::resolve(None, Some(viewer)), FeedScope::Subscribed(viewer));
        assert_eq!(FeedScope::resolve(None, None), FeedScope::All);
    }

    #[test]
    fn blank_community_name_is_ignored() {
        let q = FeedQuery {
            subreddit_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(q.community_name(), None);
    }

    #[test]
    fn sort_parses_from_query_string() {
        let q: FeedQuery =
            serde_json::from_str(r#"{"limit":5,"page":2,"subredditName":"rust","sort":"top"}"#)
                .unwrap();
        assert_eq!(q.sort, FeedSort::Top);
        assert_eq!(q.subreddit_name.as_deref(), Some("rust"));

        let q: FeedQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, FeedSort::New);
    }
}
