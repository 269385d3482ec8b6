use super::{csrf_valid, expired_session_cookie, issue_csrf, make_context, session_cookie};
use crate::services::auth::{self, SESSION_COOKIE};
use crate::services::guard;
use crate::web::error::{ApiError, ApiResult, AppResult};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

fn render_login(
    state: &AppState,
    jar: CookieJar,
    next: Option<&str>,
    email: &str,
    error: Option<&str>,
    status: StatusCode,
) -> AppResult<Response> {
    let (jar, csrf_token) = issue_csrf(state, jar);
    let mut ctx = make_context(state, None, &jar);
    ctx.insert("csrf_token", &csrf_token);
    ctx.insert("next", guard::safe_next(next));
    ctx.insert("email", email);
    if let Some(error) = error {
        ctx.insert("error", error);
    }
    let html = state.templates.render("auth/login.html", &ctx)?;
    Ok((status, jar, Html(html)).into_response())
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    render_login(&state, jar, query.next.as_deref(), "", None, StatusCode::OK)
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    #[serde(default)]
    csrf_token: String,
    next: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = form.next.as_deref();

    if !csrf_valid(&state, &jar, &form.csrf_token) {
        return render_login(
            &state,
            jar,
            next,
            &form.email,
            Some("Your form expired, please try again"),
            StatusCode::FORBIDDEN,
        );
    }

    let rate_key = format!("login:{}", form.email.trim().to_lowercase());
    if !state.rate_limiter.check(&rate_key) {
        return render_login(
            &state,
            jar,
            next,
            &form.email,
            Some("Too many sign-in attempts. Please wait a few minutes."),
            StatusCode::TOO_MANY_REQUESTS,
        );
    }

    match auth::login(&state.backend, form.email.trim(), &form.password).await {
        Ok(response) => {
            state.rate_limiter.clear(&rate_key);
            let token = auth::create_session(
                &state.db,
                &response.token,
                response.user.as_ref(),
                state.session_lifetime,
            )?;
            tracing::info!("User signed in");
            let destination = guard::safe_next(next).to_string();
            Ok((jar.add(session_cookie(&state, token)), Redirect::to(&destination)).into_response())
        }
        Err(e) if e.is_unauthorized() || e.status() == Some(StatusCode::BAD_REQUEST) => {
            state.rate_limiter.record_attempt(&rate_key);
            render_login(
                &state,
                jar,
                next,
                &form.email,
                Some("Invalid email or password"),
                StatusCode::UNAUTHORIZED,
            )
        }
        Err(e) => {
            tracing::error!("Sign-in request failed: {}", e);
            render_login(
                &state,
                jar,
                next,
                &form.email,
                Some("Sign-in is unavailable right now. Please try again."),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = auth::delete_session(&state.db, cookie.value()) {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    Ok((jar.remove(expired_session_cookie()), Redirect::to("/login")).into_response())
}

#[derive(Deserialize)]
pub struct SessionRequest {
    token: String,
}

/// POST /api/session: turns a backend token into a session cookie.
pub async fn issue_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SessionRequest>,
) -> ApiResult<Response> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("token is required"));
    }

    let user = auth::fetch_profile(&state.backend, token).await?;
    let cookie_value = auth::create_session(&state.db, token, Some(&user), state.session_lifetime)?;

    Ok((
        jar.add(session_cookie(&state, cookie_value)),
        Json(serde_json::json!({ "user": user })),
    )
        .into_response())
}

/// DELETE /api/session
pub async fn revoke_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> ApiResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        auth::delete_session(&state.db, cookie.value())?;
    }
    Ok((jar.remove(expired_session_cookie()), StatusCode::NO_CONTENT).into_response())
}
