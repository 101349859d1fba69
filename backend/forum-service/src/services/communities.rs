/// Community lifecycle and the subscription gate
use crate::db::{community_repo, subscription_repo};
use crate::error::{AppError, Result};
use crate::models::{Community, CommunityDetail, CommunitySummary};
use sqlx::PgPool;
use uuid::Uuid;

pub const TRENDING_LIMIT: i64 = 3;
pub const SEARCH_LIMIT: i64 = 5;

pub struct CommunityService {
    pool: PgPool,
}

impl CommunityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a community and subscribe its creator in one transaction
    pub async fn create(&self, creator_id: Uuid, name: &str) -> Result<Community> {
        if community_repo::name_taken(&self.pool, name).await? {
            return Err(AppError::Conflict("Subreddit already exists".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let community = community_repo::create_community(&mut *tx, name, creator_id).await?;
        subscription_repo::subscribe(&mut *tx, creator_id, community.id).await?;
        tx.commit().await?;

        tracing::info!(
            community_id = %community.id,
            creator_id = %creator_id,
            name = %community.name,
            "community created"
        );

        Ok(community)
    }

    pub async fn subscribe(&self, user_id: Uuid, community_id: Uuid) -> Result<()> {
        self.require_community(community_id).await?;

        if subscription_repo::is_subscribed(&self.pool, user_id, community_id).await? {
            return Err(AppError::Conflict(
                "You've already subscribed to this subreddit".to_string(),
            ));
        }

        // A concurrent duplicate still fails on the primary key (409)
        subscription_repo::subscribe(&self.pool, user_id, community_id).await?;

        tracing::info!(user_id = %user_id, community_id = %community_id, "subscribed");
        Ok(())
    }

    pub async fn unsubscribe(&self, user_id: Uuid, community_id: Uuid) -> Result<()> {
        let community = self.require_community(community_id).await?;

        if community.creator_id == Some(user_id) {
            return Err(AppError::Forbidden(
                "You can't unsubscribe from your own subreddit".to_string(),
            ));
        }

        if !subscription_repo::unsubscribe(&self.pool, user_id, community_id).await? {
            return Err(AppError::NotFound(
                "You are not subscribed to this subreddit".to_string(),
            ));
        }

        tracing::info!(user_id = %user_id, community_id = %community_id, "unsubscribed");
        Ok(())
    }

    /// The subscription gate: posting and commenting require membership
    pub async fn ensure_subscribed(&self, user_id: Uuid, community_id: Uuid) -> Result<()> {
        if subscription_repo::is_subscribed(&self.pool, user_id, community_id).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Subscribe to this subreddit to participate".to_string(),
            ))
        }
    }

    pub async fn detail(&self, name: &str, viewer_id: Option<Uuid>) -> Result<CommunityDetail> {
        let community = community_repo::find_summary_by_name(&self.pool, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subreddit {} does not exist", name)))?;

        let is_subscribed = match viewer_id {
            Some(user_id) => {
                subscription_repo::is_subscribed(&self.pool, user_id, community.id).await?
            }
            None => false,
        };
        let is_creator = viewer_id.is_some() && community.creator_id == viewer_id;

        Ok(CommunityDetail {
            community,
            is_subscribed,
            is_creator,
        })
    }

    pub async fn trending(&self) -> Result<Vec<CommunitySummary>> {
        Ok(community_repo::most_subscribed(&self.pool, TRENDING_LIMIT).await?)
    }

    /// Case-insensitive name prefix search; blank queries match nothing
    pub async fn search(&self, query: &str) -> Result<Vec<CommunitySummary>> {
        let prefix = query.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        Ok(community_repo::search_by_prefix(&self.pool, prefix, SEARCH_LIMIT).await?)
    }

    pub async fn require_community(&self, community_id: Uuid) -> Result<Community> {
        community_repo::find_by_id(&self.pool, community_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subreddit not found".to_string()))
    }
}
