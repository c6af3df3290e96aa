use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::form::{CommentForm, PostForm};
use crate::domain::post::{NewPost, Post, PostContent};

#[derive(Debug)]
pub enum EditOutcome {
    Updated(Post),
    /// The editor does not own the post; nothing was changed.
    NotAuthor(Post),
}

/// Write side for posts and their comments.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn clean(&self, form: &PostForm) -> Result<PostContent, DomainError> {
        let mut content = form.clean();

        if let Some(group_id) = form.group {
            if self.groups.find_by_id(group_id).await?.is_none() {
                let mut errors = content.err().unwrap_or_default();
                errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
                content = Err(errors);
            }
        }

        content.map_err(DomainError::Validation)
    }

    #[instrument(skip(self, form))]
    pub async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, DomainError> {
        let content = self.clean(form).await?;
        self.posts.create(NewPost { author_id, content }).await
    }

    #[instrument(skip(self, form))]
    pub async fn update_post(
        &self,
        post_id: i64,
        editor_id: Uuid,
        form: &PostForm,
    ) -> Result<EditOutcome, DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != editor_id {
            info!(post_id, editor_id = %editor_id, "edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let content = self.clean(form).await?;
        match self.posts.update(post_id, editor_id, content).await? {
            Some(updated) => Ok(EditOutcome::Updated(updated)),
            // Deleted between the lookup and the write.
            None => Err(DomainError::PostNotFound(post_id)),
        }
    }

    #[instrument(skip(self, form))]
    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        self.get_post(post_id).await?;
        let text = form.clean().map_err(DomainError::Validation)?;
        self.comments
            .create(NewComment {
                post_id,
                author_id,
                text,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::group::NewGroup;
    use crate::domain::post::PostScope;
    use crate::domain::user::User;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: PostService,
        author: User,
        stranger: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let author = UserRepository::create(
            store.as_ref(),
            User::new("author".into(), "author@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();
        let stranger = UserRepository::create(
            store.as_ref(),
            User::new("stranger".into(), "stranger@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();
        let service = PostService::new(store.clone(), store.clone(), store.clone());
        Fixture {
            store,
            service,
            author,
            stranger,
        }
    }

    fn form(text: &str) -> PostForm {
        PostForm {
            text: text.into(),
            ..PostForm::default()
        }
    }

    #[tokio::test]
    async fn created_post_leads_the_global_feed() {
        let f = fixture().await;
        f.service
            .create_post(f.author.id, &form("an older post"))
            .await
            .unwrap();
        let created = f
            .service
            .create_post(f.author.id, &form("the newest post"))
            .await
            .unwrap();

        let feed = PostRepository::list(f.store.as_ref(), PostScope::All, 10, 0)
            .await
            .unwrap();
        assert_eq!(feed[0].id, created.id);
        assert_eq!(feed[0].text, "the newest post");
        assert_eq!(feed[0].author_username, "author");
    }

    #[tokio::test]
    async fn invalid_post_is_not_stored() {
        let f = fixture().await;
        let mut bad = form("tiny");
        bad.group = Some(999);

        let err = f.service.create_post(f.author.id, &bad).await.unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.contains("text"));
        assert!(errors.contains("group"));
        assert_eq!(
            PostRepository::count(f.store.as_ref(), PostScope::All)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn post_can_join_existing_group() {
        let f = fixture().await;
        let group = GroupRepository::create(
            f.store.as_ref(),
            NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: "All about cats".into(),
            },
        )
        .await
        .unwrap();

        let mut with_group = form("cats are great");
        with_group.group = Some(group.id);
        let post = f.service.create_post(f.author.id, &with_group).await.unwrap();
        assert_eq!(post.group_slug.as_deref(), Some("cats"));
    }

    #[tokio::test]
    async fn non_author_edit_changes_nothing() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, &form("original text"))
            .await
            .unwrap();

        let outcome = f
            .service
            .update_post(post.id, f.stranger.id, &form("hijacked text"))
            .await
            .unwrap();
        assert!(matches!(outcome, EditOutcome::NotAuthor(_)));
        assert_eq!(f.service.get_post(post.id).await.unwrap().text, "original text");
    }

    #[tokio::test]
    async fn author_edit_keeps_creation_time() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, &form("original text"))
            .await
            .unwrap();

        let EditOutcome::Updated(updated) = f
            .service
            .update_post(post.id, f.author.id, &form("edited text"))
            .await
            .unwrap()
        else {
            panic!("author edit must apply");
        };
        assert_eq!(updated.text, "edited text");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(updated.author_id, post.author_id);
    }

    #[tokio::test]
    async fn comment_needs_text_and_existing_post() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.author.id, &form("comment on me"))
            .await
            .unwrap();

        let empty = CommentForm { text: " ".into() };
        assert!(matches!(
            f.service.add_comment(post.id, f.stranger.id, &empty).await,
            Err(DomainError::Validation(_))
        ));
        let text = CommentForm {
            text: "nice one".into(),
        };
        assert!(matches!(
            f.service.add_comment(post.id + 100, f.stranger.id, &text).await,
            Err(DomainError::PostNotFound(_))
        ));

        let comment = f
            .service
            .add_comment(post.id, f.stranger.id, &text)
            .await
            .unwrap();
        assert_eq!(comment.author_username, "stranger");
        assert_eq!(comment.post_id, post.id);
    }
}
