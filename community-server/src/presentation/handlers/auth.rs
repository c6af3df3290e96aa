use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpResponse, Scope, get, post, web};
use serde_json::json;
use tracing::info;

use crate::domain::error::DomainError;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::dto::{LoginPage, LoginRequest, NextQuery, SignupRequest};
use crate::presentation::middleware::SESSION_COOKIE;
use crate::presentation::utils::{redirect, safe_next};
use crate::state::AppState;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(signup)
        .service(login_page)
        .service(login)
        .service(logout)
}

fn session_cookie(token: String, keys: &JwtKeys) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(keys.ttl().as_secs() as i64))
        .finish()
}

#[post("/signup/")]
async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, DomainError> {
    let payload = payload.into_inner();
    let user = state
        .auth
        .register(payload.username, payload.email, payload.password.clone())
        .await?;
    let (_, token) = state.auth.login(&user.username, &payload.password).await?;

    info!(user_id = %user.id, username = %user.username, "user registered");

    let mut response = redirect("/");
    response
        .add_cookie(&session_cookie(token, state.auth.keys()))
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(response)
}

#[get("/login/")]
async fn login_page(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPage {
        fields: ["username", "password"],
        next: safe_next(query.next.as_deref()),
    })
}

#[post("/login/")]
async fn login(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let (user, token) = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    info!(username = %user.username, "user logged in");

    let mut response = redirect(safe_next(query.next.as_deref()));
    response
        .add_cookie(&session_cookie(token, state.auth.keys()))
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(response)
}

#[get("/logout/")]
async fn logout() -> HttpResponse {
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();
    HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "logged_out": true }))
}
