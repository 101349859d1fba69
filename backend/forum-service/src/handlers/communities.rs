/// Community handlers - creation, detail, membership and discovery
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::CommunityService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommunityRequest {
    #[validate(length(min = 3, max = 21, message = "Name must be 3-21 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub subreddit_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// POST /api/subreddit - answers with the new community's name
pub async fn create_community(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<CreateCommunityRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let community = CommunityService::new(pool.get_ref().clone())
        .create(user_id.0, &req.name)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(community.name))
}

/// GET /api/subreddit/{name}
pub async fn community_detail(
    pool: web::Data<PgPool>,
    viewer: Option<UserId>,
    name: web::Path<String>,
) -> Result<HttpResponse> {
    let detail = CommunityService::new(pool.get_ref().clone())
        .detail(&name, viewer.map(|u| u.0))
        .await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// POST /api/subreddit/subscribe - answers with the community id
pub async fn subscribe(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<SubscriptionRequest>,
) -> Result<HttpResponse> {
    CommunityService::new(pool.get_ref().clone())
        .subscribe(user_id.0, req.subreddit_id)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(req.subreddit_id.to_string()))
}

/// POST /api/subreddit/unsubscribe - answers with the community id
pub async fn unsubscribe(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<SubscriptionRequest>,
) -> Result<HttpResponse> {
    CommunityService::new(pool.get_ref().clone())
        .unsubscribe(user_id.0, req.subreddit_id)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(req.subreddit_id.to_string()))
}

/// GET /api/search?q=
pub async fn search_communities(
    pool: web::Data<PgPool>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let communities = CommunityService::new(pool.get_ref().clone())
        .search(&query.q)
        .await?;

    Ok(HttpResponse::Ok().json(communities))
}

/// GET /api/trending
pub async fn trending_communities(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let communities = CommunityService::new(pool.get_ref().clone())
        .trending()
        .await?;

    Ok(HttpResponse::Ok().json(communities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_name_length_is_checked() {
        let short = CreateCommunityRequest {
            name: "ab".to_string(),
        };
        assert!(short.validate().is_err());

        let long = CreateCommunityRequest {
            name: "a".repeat(22),
        };
        assert!(long.validate().is_err());

        let fine = CreateCommunityRequest {
            name: "rustaceans".to_string(),
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn subscription_body_uses_camel_case() {
        let id = Uuid::new_v4();
        let req: SubscriptionRequest =
            serde_json::from_str(&format!(r#"{{"subredditId":"{}"}}"#, id)).unwrap();
        assert_eq!(req.subreddit_id, id);
    }
}
