//! In-memory store implementing every repository trait.
//!
//! Used by the test suite and as a fallback when no database is configured.
//! Constraints and cascades mirror the SQL schema: unique usernames, slugs and
//! follow pairs, no self-follow, users cascade to their content, posts cascade
//! to comments and deleting a group only detaches its posts.
//! Data is lost on process restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::follow::{Follow, FollowOutcome};
use crate::domain::form::FormErrors;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{NewPost, Post, PostContent, PostScope};
use crate::domain::user::User;

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    created_at: chrono::DateTime<Utc>,
    author_id: Uuid,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    text: String,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    follows: BTreeMap<i64, Follow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn render_post(&self, row: &PostRow) -> Post {
        let group = row.group_id.and_then(|id| self.groups.get(&id));
        Post {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: self
                .users
                .get(&row.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            group_id: row.group_id,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
            image: row.image.clone(),
        }
    }

    fn render_comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self
                .users
                .get(&row.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            text: row.text.clone(),
            created_at: row.created_at,
        }
    }

    fn in_scope(&self, row: &PostRow, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => row.group_id == Some(group_id),
            PostScope::Author(author_id) => row.author_id == author_id,
            PostScope::FollowedBy(user_id) => self
                .follows
                .values()
                .any(|f| f.user_id == user_id && f.author_id == row.author_id),
        }
    }

    fn check_group(&self, content: &PostContent) -> Result<(), DomainError> {
        match content.group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                let mut errors = FormErrors::default();
                errors.add("group", "Select a valid choice.");
                Err(DomainError::Validation(errors))
            }
            _ => Ok(()),
        }
    }

    fn delete_post_cascade(&mut self, post_id: i64) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.delete_post_cascade(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        tables
            .follows
            .retain(|_, f| f.user_id != id && f.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        let created = Group {
            id: tables.next_id(),
            title: group.title.trim().to_string(),
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables
            .groups
            .values()
            .find(|g| g.slug == slug)
            .map(|g| g.id)
        else {
            return Ok(false);
        };

        tables.groups.remove(&id);
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(DomainError::UserNotFound(post.author_id.to_string()));
        }
        tables.check_group(&post.content)?;

        let row = PostRow {
            id: tables.next_id(),
            text: post.content.text,
            created_at: Utc::now(),
            author_id: post.author_id,
            group_id: post.content.group_id,
            image: post.content.image,
        };
        let rendered = tables.render_post(&row);
        tables.posts.insert(row.id, row);
        Ok(rendered)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|row| tables.render_post(row)))
    }

    async fn update(
        &self,
        id: i64,
        author_id: Uuid,
        content: PostContent,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        tables.check_group(&content)?;

        let Some(row) = tables
            .posts
            .get_mut(&id)
            .filter(|row| row.author_id == author_id)
        else {
            return Ok(None);
        };
        row.text = content.text;
        row.group_id = content.group_id;
        row.image = content.image;
        let row = row.clone();

        Ok(Some(tables.render_post(&row)))
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.tables.write().await.delete_post_cascade(id))
    }

    async fn count(&self, scope: PostScope) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|row| tables.in_scope(row, scope))
            .count() as u64)
    }

    async fn list(
        &self,
        scope: PostScope,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&PostRow> = tables
            .posts
            .values()
            .filter(|row| tables.in_scope(row, scope))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| tables.render_post(row))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(DomainError::UserNotFound(comment.author_id.to_string()));
        }

        let row = CommentRow {
            id: tables.next_id(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        let rendered = tables.render_comment(&row);
        tables.comments.insert(row.id, row);
        Ok(rendered)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows.into_iter().map(|c| tables.render_comment(c)).collect())
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<FollowOutcome, DomainError> {
        if user_id == author_id {
            return Err(DomainError::SelfFollow);
        }

        let mut tables = self.tables.write().await;
        if tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let id = tables.next_id();
        tables.follows.insert(
            id,
            Follow {
                id,
                user_id,
                author_id,
            },
        );
        Ok(FollowOutcome::Created)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() != before)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.tables.read().await.follows.len() as u64)
    }
}
