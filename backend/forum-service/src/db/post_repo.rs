use crate::models::{Post, PostSummary};
use crate::services::feed::{FeedScope, FeedSort};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Post joined with author, community, net score, comment count and the
/// viewer's vote. `$1` is the viewer id (NULL for anonymous viewers).
const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.author_id, u.username AS author_username,
           p.community_id, c.name AS community_name, p.created_at,
           (SELECT COUNT(*) FILTER (WHERE v.direction = 'UP')
                 - COUNT(*) FILTER (WHERE v.direction = 'DOWN')
              FROM post_votes v WHERE v.post_id = p.id) AS score,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count,
           (SELECT v.direction FROM post_votes v
              WHERE v.post_id = p.id AND v.user_id = $1) AS current_vote
    FROM posts p
    JOIN communities c ON c.id = p.community_id
    JOIN users u ON u.id = p.author_id
"#;

pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    community_id: Uuid,
    title: &str,
    content: Option<&Value>,
) -> Result<Post, sqlx::Error> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, content, author_id, community_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, content, author_id, community_id, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .bind(community_id)
    .fetch_one(pool)
    .await?;

    Ok(post)
}

pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, author_id, community_id, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

pub async fn find_summary(
    pool: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<PostSummary>, sqlx::Error> {
    let post = sqlx::query_as::<_, PostSummary>(&format!("{} WHERE p.id = $2", SUMMARY_SELECT))
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(post)
}

/// One page of the feed
pub async fn list_feed(
    pool: &PgPool,
    viewer_id: Option<Uuid>,
    scope: &FeedScope,
    sort: FeedSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostSummary>, sqlx::Error> {
    let filter = match scope {
        FeedScope::Community(_) => "WHERE c.name = $4",
        FeedScope::Subscribed(_) => {
            "WHERE p.community_id IN (SELECT s.community_id FROM subscriptions s WHERE s.user_id = $4)"
        }
        FeedScope::All => "",
    };
    let order = match sort {
        FeedSort::New => "ORDER BY p.created_at DESC, p.id DESC",
        FeedSort::Top => "ORDER BY score DESC, comment_count DESC, p.created_at DESC, p.id DESC",
    };
    let sql = format!("{} {} {} LIMIT $2 OFFSET $3", SUMMARY_SELECT, filter, order);

    let query = sqlx::query_as::<_, PostSummary>(&sql)
        .bind(viewer_id)
        .bind(limit)
        .bind(offset);

    let posts = match scope {
        FeedScope::Community(name) => query.bind(name.as_str()).fetch_all(pool).await?,
        FeedScope::Subscribed(user_id) => query.bind(*user_id).fetch_all(pool).await?,
        FeedScope::All => query.fetch_all(pool).await?,
    };

    Ok(posts)
}

/// Ids of every post in a community (for cache invalidation before a delete)
pub async fn post_ids_in_community(
    pool: &PgPool,
    community_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE community_id = $1")
        .bind(community_id)
        .fetch_all(pool)
        .await?;

    Ok(ids)
}

pub async fn post_ids_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE author_id = $1")
        .bind(author_id)
        .fetch_all(pool)
        .await?;

    Ok(ids)
}
