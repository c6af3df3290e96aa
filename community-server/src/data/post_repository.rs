use crate::data::violated_constraint;
use crate::domain::error::DomainError;
use crate::domain::form::FormErrors;
use crate::domain::post::{NewPost, Post, PostContent, PostScope};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Rewrites the content of a post owned by `author_id`. `None` when no
    /// such post belongs to that author.
    async fn update(
        &self,
        id: i64,
        author_id: Uuid,
        content: PostContent,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
    async fn count(&self, scope: PostScope) -> Result<u64, DomainError>;
    /// Newest first, ties broken by the higher id.
    async fn list(
        &self,
        scope: PostScope,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError>;
}

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.text, p.created_at, p.author_id, u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title, p.image
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

fn push_scope(query: &mut QueryBuilder<'_, Postgres>, scope: PostScope) {
    match scope {
        PostScope::All => {}
        PostScope::Group(group_id) => {
            query.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostScope::Author(author_id) => {
            query.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostScope::FollowedBy(user_id) => {
            query
                .push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

fn map_write_error(e: sqlx::Error) -> DomainError {
    if violated_constraint(&e) == Some("posts_group_id_fkey") {
        let mut errors = FormErrors::default();
        errors.add("group", "Select a valid choice.");
        return DomainError::Validation(errors);
    }
    error!("failed to write post: {}", e);
    DomainError::from(e)
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            WITH p AS (
                INSERT INTO posts (text, author_id, group_id, image)
                VALUES ($1, $2, $3, $4)
                RETURNING id, text, created_at, author_id, group_id, image
            )
            SELECT p.id, p.text, p.created_at, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug, g.title AS group_title, p.image
            FROM p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            "#,
        )
        .bind(&post.content.text)
        .bind(post.author_id)
        .bind(post.content.group_id)
        .bind(&post.content.image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        info!(post_id = created.id, author_id = %created.author_id, "post created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        query.push(" WHERE p.id = ").push_bind(id);

        query
            .build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::from(e)
            })
    }

    async fn update(
        &self,
        id: i64,
        author_id: Uuid,
        content: PostContent,
    ) -> Result<Option<Post>, DomainError> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET text = $1, group_id = $2, image = $3
            WHERE id = $4 AND author_id = $5
            "#,
        )
        .bind(&content.text)
        .bind(content.group_id)
        .bind(&content.image)
        .bind(id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        info!(post_id = id, "post updated");
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() > 0 {
            info!(post_id = id, "post deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }

    async fn count(&self, scope: PostScope) -> Result<u64, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_scope(&mut query, scope);

        let total: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while counting posts: {}", e);
                DomainError::from(e)
            })?;
        Ok(total.max(0) as u64)
    }

    async fn list(
        &self,
        scope: PostScope,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        push_scope(&mut query, scope);
        query
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        query
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while fetching posts: {}", e);
                DomainError::from(e)
            })
    }
}
