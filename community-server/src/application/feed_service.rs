use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::application::pagination::{Page, Paginator};
use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{Post, PostScope};
use crate::domain::user::Author;

#[derive(Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub author: Author,
    pub post_count: u64,
    pub following: bool,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: u64,
    pub comments: Vec<Comment>,
}

/// Read side: the posts each surface shows, in the order it shows them.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    comments: Arc<dyn CommentRepository>,
    per_page: u64,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        comments: Arc<dyn CommentRepository>,
        per_page: u64,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            comments,
            per_page,
        }
    }

    async fn paginate(
        &self,
        scope: PostScope,
        requested_page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count(scope).await?;
        let paginator = Paginator::new(total, self.per_page);
        let number = paginator.resolve(requested_page);
        let items = self
            .posts
            .list(scope, paginator.per_page(), paginator.offset(number))
            .await?;
        Ok(paginator.page(number, items))
    }

    pub async fn index(&self, requested_page: Option<&str>) -> Result<Page<Post>, DomainError> {
        self.paginate(PostScope::All, requested_page).await
    }

    #[instrument(skip(self))]
    pub async fn group_feed(
        &self,
        slug: &str,
        requested_page: Option<&str>,
    ) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self
            .paginate(PostScope::Group(group.id), requested_page)
            .await?;
        Ok(GroupFeed { group, page })
    }

    #[instrument(skip(self))]
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        requested_page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;

        let following = match viewer {
            Some(viewer) if viewer != author.id => self.follows.exists(viewer, author.id).await?,
            _ => false,
        };
        let page = self
            .paginate(PostScope::Author(author.id), requested_page)
            .await?;

        Ok(ProfileFeed {
            author: Author::from(&author),
            post_count: page.count,
            following,
            page,
        })
    }

    #[instrument(skip(self))]
    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        let author_post_count = self.posts.count(PostScope::Author(post.author_id)).await?;
        let comments = self.comments.list_for_post(post_id).await?;

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }

    #[instrument(skip(self))]
    pub async fn followed(
        &self,
        viewer: Uuid,
        requested_page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        self.paginate(PostScope::FollowedBy(viewer), requested_page)
            .await
    }
}
