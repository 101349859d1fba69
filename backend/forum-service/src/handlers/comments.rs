/// Comment handlers
use super::ok;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::CommentService;
use crate::vote::{PgVoteStore, VoteDirection, VoteService, VoteTarget};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(length(min = 1, message = "Comment text must not be empty"))]
    pub text: String,
    pub reply_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVoteRequest {
    pub comment_id: Uuid,
    pub vote_type: VoteDirection,
}

/// GET /api/posts/{post_id}/comments
pub async fn list_comments(
    pool: web::Data<PgPool>,
    viewer: Option<UserId>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let threads = CommentService::new(pool.get_ref().clone())
        .list_threads(post_id.into_inner(), viewer.map(|u| u.0))
        .await?;

    Ok(HttpResponse::Ok().json(threads))
}

/// PATCH /api/subreddit/post/comment
pub async fn create_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    if req.text.trim().is_empty() {
        return Err(AppError::Validation(
            "Comment text must not be empty".to_string(),
        ));
    }

    CommentService::new(pool.get_ref().clone())
        .create_comment(user_id.0, req.post_id, &req.text, req.reply_to_id)
        .await?;

    Ok(ok())
}

/// PATCH /api/subreddit/post/comment/vote
pub async fn vote_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<CommentVoteRequest>,
) -> Result<HttpResponse> {
    VoteService::new(PgVoteStore::new(pool.get_ref().clone()))
        .cast(user_id.0, VoteTarget::Comment(req.comment_id), req.vote_type)
        .await?;

    Ok(ok())
}
