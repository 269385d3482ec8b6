use super::BANNER_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// POST /ui/banner/dismiss
pub async fn dismiss_banner(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((BANNER_COOKIE, "1"))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(365))
        .build();
    (jar.add(cookie), StatusCode::NO_CONTENT)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
