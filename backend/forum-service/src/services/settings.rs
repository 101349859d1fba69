/// Settings mutators - community and account administration
use crate::db::{community_repo, post_repo, subscription_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::Community;
use crate::services::{CommunityService, PostService};
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationError;

/// validator-compatible check that a username uses only `[A-Za-z0-9_]`
pub fn validate_username_shape(name: &str) -> std::result::Result<(), ValidationError> {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some("Username may only contain letters, digits and underscores".into());
        Err(err)
    }
}

pub struct SettingsService {
    pool: PgPool,
    posts: PostService,
}

impl SettingsService {
    pub fn new(pool: PgPool, posts: PostService) -> Self {
        Self { pool, posts }
    }

    async fn owned_community(&self, actor_id: Uuid, community_id: Uuid) -> Result<Community> {
        let community = CommunityService::new(self.pool.clone())
            .require_community(community_id)
            .await?;

        if community.creator_id != Some(actor_id) {
            return Err(AppError::Forbidden(
                "Only the creator can manage this subreddit".to_string(),
            ));
        }
        Ok(community)
    }

    pub async fn rename_community(
        &self,
        actor_id: Uuid,
        community_id: Uuid,
        name: &str,
    ) -> Result<()> {
        let community = self.owned_community(actor_id, community_id).await?;
        if community.name == name {
            return Ok(());
        }

        if community_repo::name_taken(&self.pool, name).await? {
            return Err(AppError::Conflict("Subreddit name is taken".to_string()));
        }

        community_repo::rename(&self.pool, community_id, name).await?;

        // Cached posts carry the community name
        let post_ids = post_repo::post_ids_in_community(&self.pool, community_id).await?;
        self.posts.invalidate(&post_ids).await;

        tracing::info!(
            community_id = %community_id,
            from = %community.name,
            to = %name,
            "community renamed"
        );
        Ok(())
    }

    /// Delete a community and everything scoped to it
    pub async fn delete_community(&self, actor_id: Uuid, community_id: Uuid) -> Result<()> {
        self.owned_community(actor_id, community_id).await?;

        let post_ids = post_repo::post_ids_in_community(&self.pool, community_id).await?;
        if !community_repo::delete(&self.pool, community_id).await? {
            return Err(AppError::NotFound("Subreddit not found".to_string()));
        }

        self.posts.invalidate(&post_ids).await;

        tracing::info!(
            community_id = %community_id,
            posts_removed = post_ids.len(),
            "community deleted"
        );
        Ok(())
    }

    /// Remove `member_id` from a community the actor created
    pub async fn remove_member(
        &self,
        actor_id: Uuid,
        member_id: Uuid,
        community_id: Uuid,
    ) -> Result<()> {
        if user_repo::find_user_by_id(&self.pool, member_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let community = self.owned_community(actor_id, community_id).await?;
        if community.creator_id == Some(member_id) {
            return Err(AppError::Forbidden(
                "The creator cannot be removed from their subreddit".to_string(),
            ));
        }

        if !subscription_repo::unsubscribe(&self.pool, member_id, community_id).await? {
            return Err(AppError::NotFound(
                "User is not subscribed to this subreddit".to_string(),
            ));
        }

        tracing::info!(
            community_id = %community_id,
            member_id = %member_id,
            removed_by = %actor_id,
            "member removed"
        );
        Ok(())
    }

    /// Returns the new username
    pub async fn rename_user(&self, user_id: Uuid, name: &str) -> Result<String> {
        let user = user_repo::find_user_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.username.as_deref() == Some(name) {
            return Ok(name.to_string());
        }

        if user_repo::username_taken(&self.pool, name).await? {
            return Err(AppError::Conflict("Username is taken".to_string()));
        }

        // A racing rename still hits the unique index (409)
        user_repo::update_username(&self.pool, user_id, name).await?;

        // Cached posts carry the author's username
        let post_ids = post_repo::post_ids_by_author(&self.pool, user_id).await?;
        self.posts.invalidate(&post_ids).await;

        tracing::info!(user_id = %user_id, username = %name, "username changed");
        Ok(name.to_string())
    }

    /// Delete the caller's account. Owned content cascades; communities they
    /// created stay, with no creator.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        let post_ids = post_repo::post_ids_by_author(&self.pool, user_id).await?;

        if !user_repo::delete_user(&self.pool, user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.posts.invalidate(&post_ids).await;

        tracing::info!(user_id = %user_id, posts_removed = post_ids.len(), "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_word_characters() {
        for name in ["abc", "ferris_the_crab", "User_42", "_"] {
            assert!(validate_username_shape(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn rejects_other_characters() {
        for name in ["with space", "dash-name", "émile", "semi;colon"] {
            let err = validate_username_shape(name).unwrap_err();
            assert_eq!(err.code, "invalid_username");
        }
    }
}
