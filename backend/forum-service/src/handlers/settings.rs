/// Settings handlers - community and account administration
use super::{ok, ForumState};
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::SettingsService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameCommunityRequest {
    #[validate(length(min = 3, max = 21, message = "Name must be 3-21 characters"))]
    pub name: String,
    pub subreddit_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityIdQuery {
    pub subreddit_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberQuery {
    pub user_id: Uuid,
    pub subreddit_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameUserRequest {
    #[validate(
        length(min = 3, max = 32, message = "Username must be 3-32 characters"),
        custom(function = "crate::services::settings::validate_username_shape")
    )]
    pub name: String,
}

fn settings_service(pool: &PgPool, state: &ForumState) -> SettingsService {
    SettingsService::new(pool.clone(), state.post_service(pool))
}

/// PATCH /api/settings/subreddit (also /api/settings/subredditName)
pub async fn rename_community(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    req: web::Json<RenameCommunityRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    settings_service(&pool, &state)
        .rename_community(user_id.0, req.subreddit_id, &req.name)
        .await?;

    Ok(ok())
}

/// DELETE /api/settings/subreddit?subredditId=
pub async fn delete_community(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    query: web::Query<CommunityIdQuery>,
) -> Result<HttpResponse> {
    settings_service(&pool, &state)
        .delete_community(user_id.0, query.subreddit_id)
        .await?;

    Ok(ok())
}

/// DELETE /api/settings/subredditMember/remove?userId=&subredditId=
pub async fn remove_member(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    query: web::Query<RemoveMemberQuery>,
) -> Result<HttpResponse> {
    settings_service(&pool, &state)
        .remove_member(user_id.0, query.user_id, query.subreddit_id)
        .await?;

    Ok(ok())
}

/// PATCH /api/settings/username - answers with the new username
pub async fn rename_user(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
    req: web::Json<RenameUserRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let username = settings_service(&pool, &state)
        .rename_user(user_id.0, &req.name)
        .await?;

    Ok(HttpResponse::Ok().content_type("text/plain").body(username))
}

/// DELETE /api/settings/user
pub async fn delete_account(
    pool: web::Data<PgPool>,
    state: web::Data<ForumState>,
    user_id: UserId,
) -> Result<HttpResponse> {
    settings_service(&pool, &state)
        .delete_account(user_id.0)
        .await?;

    Ok(ok())
}
