use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::application::feed_service::PostDetail;
use crate::application::pagination::{PAGE_PARAM, Page};
use crate::domain::form::{BoundForm, CommentForm, PostForm};
use crate::domain::group::Group;
use crate::domain::post::Post;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage<'a> {
    pub fields: [&'a str; 2],
    pub next: &'a str,
}

// ======================= POSTS =======================

/// The `page` query parameter, raw. Interpreting it is the paginator's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// A repeated parameter is not an error: the last value wins.
    pub fn parse(query: &str) -> Self {
        let page = form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| *key == PAGE_PARAM)
            .map(|(_, value)| value.into_owned())
            .last();
        Self { page }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexPage<'a> {
    pub title: &'a str,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page: Page<Post>,
}

/// The create / edit form, with the groups a post may be filed under.
#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    pub form: BoundForm<PostForm>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    #[serde(flatten)]
    pub detail: PostDetail,
    pub form: BoundForm<CommentForm>,
}

// ======================= ADMIN =======================

#[derive(Debug, Serialize)]
pub struct CacheCleared {
    pub cleared: usize,
}
