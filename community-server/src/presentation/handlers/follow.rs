use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::presentation::dto::{FollowPage, PageQuery};
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect, request_id};
use crate::state::AppState;

/// Posts by every author the viewer follows.
#[get("/follow/")]
async fn follow_index(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let page = state.feeds.followed(user.id, query.page.as_deref()).await?;
    Ok(HttpResponse::Ok().json(FollowPage { page }))
}

#[get("/profile/{username}/follow/")]
async fn profile_follow(
    req: HttpRequest,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    match state.follows.follow(user.id, &username).await {
        Ok(outcome) => {
            info!(
                request_id = %request_id(&req),
                follower = %user.username,
                author = %username,
                ?outcome,
                "follow"
            );
        }
        Err(DomainError::SelfFollow) => {
            warn!(
                request_id = %request_id(&req),
                username = %user.username,
                "self-follow rejected"
            );
        }
        Err(e) => return Err(e),
    }
    Ok(redirect(profile_url(&username)))
}

#[get("/profile/{username}/unfollow/")]
async fn profile_unfollow(
    req: HttpRequest,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let removed = state.follows.unfollow(user.id, &username).await?;
    info!(
        request_id = %request_id(&req),
        follower = %user.username,
        author = %username,
        removed,
        "unfollow"
    );
    Ok(redirect(profile_url(&username)))
}
