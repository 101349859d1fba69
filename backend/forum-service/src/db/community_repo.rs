use crate::models::{Community, CommunitySummary};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.name, c.creator_id, u.username AS creator_username, c.created_at,
           (SELECT COUNT(*) FROM subscriptions s WHERE s.community_id = c.id) AS subscriber_count
    FROM communities c
    LEFT JOIN users u ON u.id = c.creator_id
"#;

pub async fn create_community<'e, E>(
    executor: E,
    name: &str,
    creator_id: Uuid,
) -> Result<Community, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let community = sqlx::query_as::<_, Community>(
        r#"
        INSERT INTO communities (name, creator_id)
        VALUES ($1, $2)
        RETURNING id, name, creator_id, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(creator_id)
    .fetch_one(executor)
    .await?;

    Ok(community)
}

pub async fn find_by_id(pool: &PgPool, community_id: Uuid) -> Result<Option<Community>, sqlx::Error> {
    let community = sqlx::query_as::<_, Community>(
        r#"
        SELECT id, name, creator_id, created_at, updated_at
        FROM communities
        WHERE id = $1
        "#,
    )
    .bind(community_id)
    .fetch_optional(pool)
    .await?;

    Ok(community)
}

pub async fn name_taken(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM communities WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

pub async fn find_summary_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<CommunitySummary>, sqlx::Error> {
    let community = sqlx::query_as::<_, CommunitySummary>(&format!(
        "{} WHERE c.name = $1",
        SUMMARY_SELECT
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(community)
}

/// Communities ordered by subscriber count, largest first
pub async fn most_subscribed(pool: &PgPool, limit: i64) -> Result<Vec<CommunitySummary>, sqlx::Error> {
    let communities = sqlx::query_as::<_, CommunitySummary>(&format!(
        "{} ORDER BY subscriber_count DESC, c.created_at ASC LIMIT $1",
        SUMMARY_SELECT
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(communities)
}

/// Case-insensitive name prefix search
pub async fn search_by_prefix(
    pool: &PgPool,
    prefix: &str,
    limit: i64,
) -> Result<Vec<CommunitySummary>, sqlx::Error> {
    let pattern = format!("{}%", escape_like(prefix));
    let communities = sqlx::query_as::<_, CommunitySummary>(&format!(
        "{} WHERE c.name ILIKE $1 ESCAPE '\\' ORDER BY subscriber_count DESC, c.name ASC LIMIT $2",
        SUMMARY_SELECT
    ))
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(communities)
}

pub async fn rename(pool: &PgPool, community_id: Uuid, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE communities
        SET name = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(name)
    .bind(community_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a community; posts, comments, votes and subscriptions cascade
pub async fn delete<'e, E>(executor: E, community_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM communities WHERE id = $1")
        .bind(community_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Escape `%`, `_` and `\` so user input matches literally in LIKE patterns
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%_real"), "100\\%\\_real");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
