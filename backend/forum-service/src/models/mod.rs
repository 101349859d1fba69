/// Data models for forum-service
///
/// Row types map one-to-one onto the tables created by the embedded
/// migrations; the `*View` / `*Summary` types are read models assembled by
/// joins for the JSON API. Field names serialize in camelCase to match what
/// the browser client already sends and expects.
use crate::vote::VoteDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named community ("subreddit")
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    /// `None` once the creator deleted their account
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Rich-text editor document, stored verbatim
    pub content: Option<serde_json::Value>,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Feed / detail row: a post joined with its author, community and vote totals
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: Option<serde_json::Value>,
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub community_id: Uuid,
    pub community_name: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: i64,
    /// The viewer's own vote, `None` for anonymous viewers or no vote
    pub current_vote: Option<VoteDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    pub id: Uuid,
    pub name: String,
    pub creator_id: Option<Uuid>,
    pub creator_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subscriber_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDetail {
    #[serde(flatten)]
    pub community: CommunitySummary,
    pub is_subscribed: bool,
    pub is_creator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub post_id: Uuid,
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    pub current_vote: Option<VoteDirection>,
}

/// A top-level comment with every reply of its thread, one level deep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}
