use crate::models::{Comment, CommentView};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
    reply_to_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (text, author_id, post_id, reply_to_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, text, author_id, post_id, reply_to_id, created_at
        "#,
    )
    .bind(text)
    .bind(author_id)
    .bind(post_id)
    .bind(reply_to_id)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

pub async fn find_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, text, author_id, post_id, reply_to_id, created_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Every comment on a post, newest first, with score and the viewer's vote
pub async fn list_for_post(
    pool: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Vec<CommentView>, sqlx::Error> {
    let comments = sqlx::query_as::<_, CommentView>(
        r#"
        SELECT cm.id, cm.text, cm.author_id, u.username AS author_username,
               cm.post_id, cm.reply_to_id, cm.created_at,
               (SELECT COUNT(*) FILTER (WHERE v.direction = 'UP')
                     - COUNT(*) FILTER (WHERE v.direction = 'DOWN')
                  FROM comment_votes v WHERE v.comment_id = cm.id) AS score,
               (SELECT v.direction FROM comment_votes v
                  WHERE v.comment_id = cm.id AND v.user_id = $2) AS current_vote
        FROM comments cm
        JOIN users u ON u.id = cm.author_id
        WHERE cm.post_id = $1
        ORDER BY cm.created_at DESC, cm.id DESC
        "#,
    )
    .bind(post_id)
    .bind(viewer_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
