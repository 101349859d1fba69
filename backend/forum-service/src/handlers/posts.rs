/// Post handlers - feed, detail, creation and voting
use super::{ok, ForumState};
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::{FeedQuery, FeedService};
use crate::vote::{PgVoteStore, VoteDirection, VoteService, VoteTarget};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub subreddit_id: Uuid,
    #[validate(length(min = 3, max = 128, message = "Title must be 3-128 characters"))]
    pub title: String,
    /// Editor document, stored as-is
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVoteRequest {
    pub post_id: Uuid,
    pub vote_type: VoteDirection,
}

/// GET /api/posts
pub async fn get_feed(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    viewer: Option<UserId>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let posts = FeedService::new(pool.get_ref().clone(), state.feed.clone())
        .page(&query, viewer.map(|u| u.0))
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{post_id}
pub async fn get_post(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    viewer: Option<UserId>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state
        .post_service(&pool)
        .get_post(post_id.into_inner(), viewer.map(|u| u.0))
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/subreddit/post/create
pub async fn create_post(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    state
        .post_service(&pool)
        .create_post(user_id.0, req.subreddit_id, &req.title, req.content.as_ref())
        .await?;

    Ok(ok())
}

/// PATCH /api/subreddit/post/vote
pub async fn vote_post(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    req: web::Json<PostVoteRequest>,
) -> Result<HttpResponse> {
    let votes = VoteService::new(PgVoteStore::new(pool.get_ref().clone()));
    let outcome = votes
        .cast(user_id.0, VoteTarget::Post(req.post_id), req.vote_type)
        .await?;

    state
        .post_service(&pool)
        .refresh_cache_after_vote(req.post_id, outcome.tally.score())
        .await;

    Ok(ok())
}
