use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::group_repository::GroupRepository;
use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroup};

/// Group management, reachable only through the administrator surface.
#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>) -> Self {
        Self { groups }
    }

    pub async fn list(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list().await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        group.validate().map_err(DomainError::Validation)?;
        self.groups.create(group).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, slug: &str) -> Result<(), DomainError> {
        if !self.groups.delete(slug).await? {
            return Err(DomainError::GroupNotFound(slug.to_string()));
        }
        info!(slug, "group removed, posts detached");
        Ok(())
    }
}
