/// Postgres-backed vote store
///
/// Post and comment votes live in separate tables with the same shape; the
/// primary key on (user_id, target) is what keeps one vote per voter.
use super::{Tally, VoteDirection, VoteStore, VoteTarget, VoteTransition};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Table and column names for one kind of target
struct VoteTable {
    votes: &'static str,
    target_column: &'static str,
    targets: &'static str,
}

fn table_for(target: VoteTarget) -> VoteTable {
    match target {
        VoteTarget::Post(_) => VoteTable {
            votes: "post_votes",
            target_column: "post_id",
            targets: "posts",
        },
        VoteTarget::Comment(_) => VoteTable {
            votes: "comment_votes",
            target_column: "comment_id",
            targets: "comments",
        },
    }
}

fn stale(target: VoteTarget) -> AppError {
    AppError::Conflict(format!(
        "vote on {} {} changed concurrently",
        target.kind(),
        target.id()
    ))
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn target_exists(&self, target: VoteTarget) -> Result<bool> {
        let table = table_for(target);
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            table.targets
        ))
        .bind(target.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn current_vote(
        &self,
        voter_id: Uuid,
        target: VoteTarget,
    ) -> Result<Option<VoteDirection>> {
        let table = table_for(target);
        let direction: Option<VoteDirection> = sqlx::query_scalar(&format!(
            "SELECT direction FROM {} WHERE user_id = $1 AND {} = $2",
            table.votes, table.target_column
        ))
        .bind(voter_id)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(direction)
    }

    async fn apply(
        &self,
        voter_id: Uuid,
        target: VoteTarget,
        transition: VoteTransition,
    ) -> Result<()> {
        let table = table_for(target);

        // Every statement is guarded by the state the transition was decided
        // from, so a lost race touches zero rows (or trips the primary key).
        let result = match transition {
            VoteTransition::Create(direction) => {
                sqlx::query(&format!(
                    "INSERT INTO {} (user_id, {}, direction) VALUES ($1, $2, $3)",
                    table.votes, table.target_column
                ))
                .bind(voter_id)
                .bind(target.id())
                .bind(direction)
                .execute(&self.pool)
                .await
            }
            VoteTransition::Remove(direction) => {
                sqlx::query(&format!(
                    "DELETE FROM {} WHERE user_id = $1 AND {} = $2 AND direction = $3",
                    table.votes, table.target_column
                ))
                .bind(voter_id)
                .bind(target.id())
                .bind(direction)
                .execute(&self.pool)
                .await
            }
            VoteTransition::Switch { from, to } => {
                sqlx::query(&format!(
                    "UPDATE {} SET direction = $4 WHERE user_id = $1 AND {} = $2 AND direction = $3",
                    table.votes, table.target_column
                ))
                .bind(voter_id)
                .bind(target.id())
                .bind(from)
                .bind(to)
                .execute(&self.pool)
                .await
            }
        };

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(()),
            Ok(_) => Err(stale(target)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(stale(target))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn tally(&self, target: VoteTarget) -> Result<Tally> {
        let table = table_for(target);
        let (up, down): (i64, i64) = sqlx::query_as(&format!(
            r#"
            SELECT COUNT(*) FILTER (WHERE direction = 'UP'),
                   COUNT(*) FILTER (WHERE direction = 'DOWN')
            FROM {}
            WHERE {} = $1
            "#,
            table.votes, table.target_column
        ))
        .bind(target.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(Tally { up, down })
    }
}
