use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowOutcome;
use crate::domain::user::User;

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { follows, users }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Re-following is a no-op; the store settles duplicates.
    #[instrument(skip(self))]
    pub async fn follow(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<FollowOutcome, DomainError> {
        let author = self.author(username).await?;
        if author.id == user_id {
            return Err(DomainError::SelfFollow);
        }

        let outcome = self.follows.create(user_id, author.id).await?;
        info!(?outcome, author = %author.username, "follow requested");
        Ok(outcome)
    }

    /// Returns whether an edge was removed; a missing edge is not an error.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, user_id: Uuid, username: &str) -> Result<bool, DomainError> {
        let author = self.author(username).await?;
        self.follows.delete(user_id, author.id).await
    }
}
