use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::application::auth_service::AuthService;
use crate::application::feed_service::FeedService;
use crate::application::follow_service::FollowService;
use crate::application::group_service::GroupService;
use crate::application::post_service::PostService;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::follow_repository::{FollowRepository, PostgresFollowRepository};
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::MemoryStore;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::cache::{InMemoryPageCache, PageCache};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;

/// One handle per entity store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            follows: Arc::new(PostgresFollowRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }
}

/// Shared application state, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub feeds: FeedService,
    pub posts: PostService,
    pub follows: FollowService,
    pub groups: GroupService,
    pub cache: Arc<dyn PageCache>,
    pub index_cache_ttl: Duration,
    pub admin_token: Option<String>,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        let keys = JwtKeys::new(config.jwt_secret.clone(), config.session_ttl);
        Self {
            auth: AuthService::new(repos.users.clone(), keys),
            feeds: FeedService::new(
                repos.posts.clone(),
                repos.groups.clone(),
                repos.users.clone(),
                repos.follows.clone(),
                repos.comments.clone(),
                config.posts_per_page,
            ),
            posts: PostService::new(
                repos.posts.clone(),
                repos.groups.clone(),
                repos.comments.clone(),
            ),
            follows: FollowService::new(repos.follows.clone(), repos.users.clone()),
            groups: GroupService::new(repos.groups),
            cache: Arc::new(InMemoryPageCache::new()),
            index_cache_ttl: config.index_cache_ttl,
            admin_token: config.admin_token.clone(),
            cors_origins: config.cors_origins.clone(),
        }
    }
}
