pub mod assets;
pub mod auth;
pub mod events;
pub mod gallery;
pub mod organizations;
pub mod proxy;
pub mod static_files;
pub mod ui;

use crate::models::User;
use crate::services::auth::SESSION_COOKIE;
use crate::web::security::CSRF_COOKIE;
use crate::web::state::AppState;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tera::Context;

pub const BANNER_COOKIE: &str = "banner_dismissed";

fn make_context(state: &AppState, user: Option<&User>, jar: &CookieJar) -> Context {
    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("user", &user);
    ctx.insert("version", env!("CARGO_PKG_VERSION"));
    ctx.insert("error_reset_secs", &state.config.ui.error_reset_secs);
    let banner = state
        .config
        .ui
        .banner
        .as_ref()
        .filter(|_| jar.get(BANNER_COOKIE).is_none());
    ctx.insert("banner", &banner);
    ctx
}

/// Issues a fresh CSRF token: the returned jar carries the cookie half.
fn issue_csrf(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    let token = state.csrf.generate();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.auth.secure_cookie)
        .build();
    (jar.add(cookie), token)
}

fn csrf_valid(state: &AppState, jar: &CookieJar, form_token: &str) -> bool {
    jar.get(CSRF_COOKIE)
        .map(|c| state.csrf.validate(form_token, c.value()))
        .unwrap_or(false)
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let secs = i64::try_from(state.session_lifetime.as_secs()).unwrap_or(i64::MAX);
    let max_age = time::Duration::seconds(secs);
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookie)
        .max_age(max_age)
        .build()
}

pub(crate) fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Treats an empty form field as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn checkbox(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on" | "true" | "1"))
}
