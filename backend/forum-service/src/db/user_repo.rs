use crate::models::User;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Insert a user record (accounts are provisioned by the sign-in provider)
pub async fn create_user(
    pool: &PgPool,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email)
        VALUES ($1, $2)
        RETURNING id, username, name, email, image, created_at
        "#,
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, name, email, image, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Returns false when the user does not exist
pub async fn update_username(
    pool: &PgPool,
    user_id: Uuid,
    username: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
        .bind(username)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an account; foreign keys remove everything the user owns
pub async fn delete_user<'e, E>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
