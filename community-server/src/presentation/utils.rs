use std::fmt;

use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web,
};
use futures_util::future::{Ready, ready};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::User;
use crate::infrastructure::security::secrets_match;
use crate::presentation::dto::PageQuery;
use crate::presentation::middleware::RequestId;
use crate::state::AppState;

pub const LOGIN_URL: &str = "/auth/login/";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// The signed-in user, attached to the request by the session middleware.
///
/// Extracting it on an anonymous request sends the client to the login page
/// with the requested path in `next`. Use `Option<AuthenticatedUser>` where
/// anonymous visitors are welcome.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(LoginRequired::for_request(req).into())),
        }
    }
}

#[derive(Debug)]
pub struct LoginRequired {
    next: String,
}

impl LoginRequired {
    fn for_request(req: &HttpRequest) -> Self {
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());
        Self { next }
    }

    pub fn location(&self) -> String {
        login_url(&self.next)
    }
}

impl fmt::Display for LoginRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login required for {}", self.next)
    }
}

impl ResponseError for LoginRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        redirect(self.location())
    }
}

/// Passes only requests carrying the configured administrator token.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequest for Admin {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let expected = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.admin_token.clone());
        let given = req
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        match (expected, given) {
            (Some(expected), Some(given)) if secrets_match(&expected, given) => ready(Ok(Admin)),
            _ => ready(Err(DomainError::Forbidden.into())),
        }
    }
}

impl FromRequest for PageQuery {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(PageQuery::parse(req.query_string())))
    }
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A local path carried in `next`; slashes stay readable.
const NEXT_PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');

pub fn login_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", utf8_percent_encode(next, NEXT_PATH))
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", utf8_percent_encode(username, PATH_SEGMENT))
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

/// Accepts only local absolute paths as a post-login destination.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_slashes_readable() {
        assert_eq!(login_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(
            login_url("/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }

    #[test]
    fn profile_url_escapes_username() {
        assert_eq!(profile_url("leo"), "/profile/leo/");
        assert_eq!(profile_url("лев"), "/profile/%D0%BB%D0%B5%D0%B2/");
        assert_eq!(profile_url("a/b"), "/profile/a%2Fb/");
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/follow/")), "/follow/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
