use actix_web::{HttpResponse, Scope, delete, get, post, web};
use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::group::NewGroup;
use crate::presentation::dto::CacheCleared;
use crate::presentation::utils::Admin;
use crate::state::AppState;

/// Out-of-band administration, gated by the shared admin token.
pub fn scope() -> Scope {
    web::scope("/admin")
        .service(list_groups)
        .service(create_group)
        .service(delete_group)
        .service(clear_cache)
}

#[get("/groups/")]
async fn list_groups(_: Admin, state: web::Data<AppState>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(state.groups.list().await?))
}

#[post("/groups/")]
async fn create_group(
    _: Admin,
    state: web::Data<AppState>,
    payload: web::Json<NewGroup>,
) -> Result<HttpResponse, DomainError> {
    let group = state.groups.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(group))
}

#[delete("/groups/{slug}/")]
async fn delete_group(
    _: Admin,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    state.groups.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/cache/clear/")]
async fn clear_cache(_: Admin, state: web::Data<AppState>) -> HttpResponse {
    let cleared = state.cache.clear().await;
    info!(cleared, "page cache cleared");
    HttpResponse::Ok().json(CacheCleared { cleared })
}
