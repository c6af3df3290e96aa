use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};

use crate::application::post_service::EditOutcome;
use crate::domain::error::DomainError;
use crate::domain::form::{BoundForm, CommentForm, FormErrors, PostForm};
use crate::presentation::dto::{IndexPage, PageQuery, PostDetailPage, PostFormPage};
use crate::presentation::utils::{AuthenticatedUser, post_url, profile_url, redirect, request_id};
use crate::state::AppState;

pub const INDEX_CACHE_PREFIX: &str = "index_page";
const INDEX_TITLE: &str = "Latest posts";

fn json_body(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body)
}

fn render<T: serde::Serialize>(page: &T) -> Result<String, DomainError> {
    serde_json::to_string(page).map_err(|e| DomainError::Internal(e.to_string()))
}

/// One entry per requested page number; anything unparsable shares page 1.
fn index_cache_key(query: &PageQuery) -> String {
    let number = query
        .page
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(1);
    format!("{INDEX_CACHE_PREFIX}:{number}")
}

/// Global feed, served from the page cache while the entry is fresh.
#[get("/")]
async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let key = index_cache_key(&query);
    if let Some(body) = state.cache.get(&key).await {
        debug!(request_id = %request_id(&req), key = %key, "index served from cache");
        return Ok(json_body(body));
    }

    let page = state.feeds.index(query.page.as_deref()).await?;
    let body = render(&IndexPage {
        title: INDEX_TITLE,
        page,
    })?;
    state
        .cache
        .set(&key, body.clone(), state.index_cache_ttl)
        .await;

    Ok(json_body(body))
}

#[get("/group/{slug}/")]
async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let feed = state
        .feeds
        .group_feed(&path.into_inner(), query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[get("/profile/{username}/")]
async fn profile(
    viewer: Option<AuthenticatedUser>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse, DomainError> {
    let feed = state
        .feeds
        .profile(
            &path.into_inner(),
            viewer.map(|v| v.id),
            query.page.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

async fn detail_page(
    state: &AppState,
    post_id: i64,
    form: BoundForm<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let detail = state.feeds.post_detail(post_id).await?;
    Ok(HttpResponse::Ok().json(PostDetailPage { detail, form }))
}

#[get("/posts/{id}/")]
async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    detail_page(
        &state,
        path.into_inner(),
        BoundForm::unbound(CommentForm::default()),
    )
    .await
}

async fn form_page(
    state: &AppState,
    post_id: Option<i64>,
    fields: PostForm,
    errors: FormErrors,
) -> Result<HttpResponse, DomainError> {
    let groups = state.groups.list().await?;
    Ok(HttpResponse::Ok().json(PostFormPage {
        is_edit: post_id.is_some(),
        post_id,
        form: BoundForm::with_errors(fields, errors),
        groups,
    }))
}

#[get("/create/")]
async fn create_form(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, DomainError> {
    form_page(&state, None, PostForm::default(), FormErrors::default()).await
}

#[post("/create/")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: web::Json<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let form = payload.into_inner();
    match state.posts.create_post(user.id, &form).await {
        Ok(post) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = post.id,
                label = %post.label(),
                "post created"
            );
            Ok(redirect(profile_url(&user.username)))
        }
        Err(DomainError::Validation(errors)) => form_page(&state, None, form, errors).await,
        Err(e) => Err(e),
    }
}

#[get("/posts/{id}/edit/")]
async fn edit_form(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = state.posts.get_post(post_id).await?;
    if post.author_id != user.id {
        return Ok(redirect(post_url(post_id)));
    }
    form_page(
        &state,
        Some(post_id),
        PostForm::from_post(&post),
        FormErrors::default(),
    )
    .await
}

/// Only the author's submission has an effect; anyone else is sent back to
/// the post unchanged.
#[post("/posts/{id}/edit/")]
async fn edit_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let form = payload.into_inner();
    match state.posts.update_post(post_id, user.id, &form).await {
        Ok(EditOutcome::Updated(post)) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = post.id,
                "post updated"
            );
            Ok(redirect(post_url(post_id)))
        }
        Ok(EditOutcome::NotAuthor(_)) => Ok(redirect(post_url(post_id))),
        Err(DomainError::Validation(errors)) => {
            form_page(&state, Some(post_id), form, errors).await
        }
        Err(e) => Err(e),
    }
}

/// An invalid comment re-renders the post with the form errors, like the
/// post forms do.
#[post("/posts/{id}/comment/")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let form = payload.into_inner();
    match state.posts.add_comment(post_id, user.id, &form).await {
        Ok(comment) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id,
                comment_id = comment.id,
                "comment added"
            );
            Ok(redirect(post_url(post_id)))
        }
        Err(DomainError::Validation(errors)) => {
            detail_page(&state, post_id, BoundForm::with_errors(form, errors)).await
        }
        Err(e) => Err(e),
    }
}
