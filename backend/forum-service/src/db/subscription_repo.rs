use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

pub async fn is_subscribed(
    pool: &PgPool,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND community_id = $2)",
    )
    .bind(user_id)
    .bind(community_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert a membership; a duplicate surfaces as a unique violation
pub async fn subscribe<'e, E>(
    executor: E,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO subscriptions (user_id, community_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(community_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Returns false when there was no membership to remove
pub async fn unsubscribe(
    pool: &PgPool,
    user_id: Uuid,
    community_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND community_id = $2")
        .bind(user_id)
        .bind(community_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_subscribers(pool: &PgPool, community_id: Uuid) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE community_id = $1")
        .bind(community_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
