use crate::data::violated_constraint;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowOutcome;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

/// Follow edges. Uniqueness of `(user, author)` and the ban on following
/// oneself belong to the store, so concurrent requests cannot slip past them.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<FollowOutcome, DomainError>;
    /// `true` when an edge was removed.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn count(&self) -> Result<u64, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<FollowOutcome, DomainError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some("cant_follow_yourself") {
                DomainError::SelfFollow
            } else {
                error!("failed to create follow: {}", e);
                DomainError::from(e)
            }
        })?;

        if inserted.rows_affected() == 0 {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        info!(user_id = %user_id, author_id = %author_id, "follow created");
        Ok(FollowOutcome::Created)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() > 0 {
            info!(user_id = %user_id, author_id = %author_id, "follow removed");
        }
        Ok(deleted.rows_affected() > 0)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::from)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }
}
