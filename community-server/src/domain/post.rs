use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Number of characters of the text used as a post's short label.
pub const LABEL_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
}

impl Post {
    pub fn label(&self) -> String {
        self.text.chars().take(LABEL_CHARS).collect()
    }
}

/// Validated content of a post, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: PostContent,
}

/// Which posts a feed is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_cut_on_char_boundary() {
        let post = Post {
            id: 1,
            text: "Привет, это довольно длинный пост".into(),
            created_at: Utc::now(),
            author_id: Uuid::new_v4(),
            author_username: "leo".into(),
            group_id: None,
            group_slug: None,
            group_title: None,
            image: None,
        };
        assert_eq!(post.label().chars().count(), LABEL_CHARS);
        assert_eq!(post.label(), "Привет, это дов");
    }
}
