//! Shared fixtures: an application over the in-memory store with a few users.

#![allow(dead_code)]

use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use community_server::data::group_repository::GroupRepository;
use community_server::data::user_repository::UserRepository;
use community_server::domain::form::PostForm;
use community_server::domain::group::{Group, NewGroup};
use community_server::domain::post::Post;
use community_server::domain::user::User;
use community_server::infrastructure::config::AppConfig;
use community_server::presentation::middleware::SESSION_COOKIE;
use community_server::state::{AppState, Repositories};

pub const ADMIN_TOKEN: &str = "admin-secret";

pub struct Fixture {
    pub state: AppState,
    pub repos: Repositories,
    pub leo: User,
    pub ann: User,
    pub group: Group,
}

pub fn config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        jwt_secret: "test-secret".into(),
        cors_origins: Vec::new(),
        posts_per_page: 10,
        index_cache_ttl: Duration::from_secs(300),
        session_ttl: Duration::from_secs(3600),
        admin_token: Some(ADMIN_TOKEN.into()),
    }
}

pub async fn fixture() -> Fixture {
    let repos = Repositories::in_memory();
    let state = AppState::new(repos.clone(), &config());

    // Stored hashes are never checked here; sessions are minted directly.
    let leo = repos
        .users
        .create(User::new("leo".into(), "leo@example.com".into(), "x".into()))
        .await
        .unwrap();
    let ann = repos
        .users
        .create(User::new("ann".into(), "ann@example.com".into(), "x".into()))
        .await
        .unwrap();
    let group = repos
        .groups
        .create(NewGroup {
            title: "Rustaceans".into(),
            slug: "rust".into(),
            description: "Posts about Rust".into(),
        })
        .await
        .unwrap();

    Fixture {
        state,
        repos,
        leo,
        ann,
        group,
    }
}

impl Fixture {
    pub fn session(&self, user: &User) -> Cookie<'static> {
        let token = self.state.auth.keys().generate_token(user.id).unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.state
            .posts
            .create_post(
                author.id,
                &PostForm {
                    text: text.into(),
                    group: group.map(|g| g.id),
                    image: None,
                },
            )
            .await
            .unwrap()
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect carries a location")
        .to_str()
        .unwrap()
        .to_string()
}
