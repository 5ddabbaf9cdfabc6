//! Login gate for the pages
//!
//! A successful login stores a random token in `AppState::sessions` and
//! hands it to the browser as the `cheminf_session` cookie.

use super::error::ApiResult;
use super::pages::render;
use super::SharedState;
use axum::extract::{Form, Request, State};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use minijinja::context;
use serde::Deserialize;
use tracing::{info, warn};

pub const SESSION_COOKIE: &str = "cheminf_session";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

async fn login_page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    render(&state, "login.html", context! { status => None::<String> })
}

async fn login(State(state): State<SharedState>, jar: CookieJar, Form(form): Form<LoginForm>) -> ApiResult<Response> {
    let config = &state.config;
    if form.username != config.admin_user || form.password != config.admin_password {
        warn!(username = %form.username, "rejected login");
        let page = render(&state, "login.html", context! { status => "Invalid username or password" })?;
        return Ok(page.into_response());
    }

    let token = uuid::Uuid::new_v4().to_string();
    state.sessions.write().await.insert(token.clone());
    info!(username = %form.username, "logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token)).path("/").http_only(true);
    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

async fn logout(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.write().await.remove(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

/// Middleware: pass requests carrying a live session, send the rest to
/// `/login`.
pub async fn require_login(State(state): State<SharedState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let logged_in = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.read().await.contains(cookie.value()),
        None => false,
    };
    if logged_in {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}
