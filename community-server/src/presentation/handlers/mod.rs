pub mod admin;
pub mod auth;
pub mod follow;
pub mod posts;

use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::DomainError;

/// Every route of the site plus the JSON not-found fallback.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|_, req| {
        DomainError::PageNotFound(req.path().to_string()).into()
    }))
    .service(health)
    .service(auth::scope())
    .service(admin::scope())
    .service(posts::index)
    .service(posts::group_posts)
    .service(posts::profile)
    .service(posts::post_detail)
    .service(posts::create_form)
    .service(posts::create_post)
    .service(posts::edit_form)
    .service(posts::edit_post)
    .service(posts::add_comment)
    .service(follow::follow_index)
    .service(follow::profile_follow)
    .service(follow::profile_unfollow)
    .default_service(web::to(not_found));
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn not_found(req: HttpRequest) -> Result<HttpResponse, DomainError> {
    Err(DomainError::PageNotFound(req.path().to_string()))
}
