use crate::models::User;
use crate::services::auth::{self, SESSION_COOKIE};
use crate::services::guard::{self, GuardDecision, RouteRole, SessionState, LOGIN_PATH};
use crate::web::error::{AppError, TokenRejected};
use crate::web::handlers::expired_session_cookie;
use crate::web::state::AppState;
use axum::body::Body;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Signed-in caller, placed in request extensions by [`enforce`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: i64,
    pub access_token: String,
    pub user: User,
}

impl AuthContext {
    pub fn token(&self) -> &str {
        &self.access_token
    }
}

pub struct CurrentUser(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let ctx = parts.extensions.get::<AuthContext>().cloned();
        Box::pin(async move { ctx.map(CurrentUser).ok_or(StatusCode::UNAUTHORIZED) })
    }
}

pub struct OptionalUser(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let ctx = parts.extensions.get::<AuthContext>().cloned();
        Box::pin(async move { Ok(OptionalUser(ctx)) })
    }
}

/// True when the caller asked for JSON rather than an HTML fragment.
pub struct WantsJson(pub bool);

impl<S> FromRequestParts<S> for WantsJson
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let wants_json = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        Box::pin(async move { Ok(WantsJson(wants_json)) })
    }
}

fn session_state(session: Option<&crate::models::Session>) -> SessionState {
    match session {
        None => SessionState::ANONYMOUS,
        Some(s) => SessionState {
            logged_in: true,
            pro: s.user.as_ref().is_some_and(|u| u.is_pro),
            hydrated: s.is_hydrated(),
        },
    }
}

/// Applies the route role's access rule before the handler runs.
pub async fn enforce(
    role: RouteRole,
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let mut session = match token.as_deref() {
        Some(t) => match auth::get_session(&state.db, t) {
            Ok(s) => s,
            Err(e) => return AppError::from(e).into_response(),
        },
        None => None,
    };

    let mut decision = guard::decide(role, session_state(session.as_ref()));
    if decision == GuardDecision::Hydrate {
        if let Some(current) = session.take() {
            match auth::fetch_profile(&state.backend, &current.access_token).await {
                Ok(user) => {
                    if let Err(e) = auth::hydrate_session(&state.db, current.id, &user) {
                        tracing::warn!("Could not cache profile for session {}: {}", current.id, e);
                    }
                    session = Some(crate::models::Session {
                        user: Some(user),
                        ..current
                    });
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::info!("Dropping session {}: backend rejected its token", current.id);
                    if let Err(e) = auth::delete_session_by_id(&state.db, current.id) {
                        tracing::warn!("Could not delete session {}: {}", current.id, e);
                    }
                }
                Err(e) => return AppError::from(e).into_response(),
            }
        }
        decision = guard::decide(role, session_state(session.as_ref()));
    }

    match decision {
        GuardDecision::Render => {
            let mut session_id = None;
            if let Some(crate::models::Session {
                id,
                access_token,
                user: Some(user),
                ..
            }) = session
            {
                session_id = Some(id);
                request.extensions_mut().insert(AuthContext {
                    session_id: id,
                    access_token,
                    user,
                });
            }
            let response = next.run(request).await;
            match session_id {
                Some(id) if response.extensions().get::<TokenRejected>().is_some() => {
                    revoke_session(&state, id, jar, response)
                }
                _ => response,
            }
        }
        GuardDecision::Redirect(LOGIN_PATH) => {
            let next_path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            Redirect::to(&guard::login_redirect(&next_path)).into_response()
        }
        GuardDecision::Redirect(path) => Redirect::to(path).into_response(),
        GuardDecision::Hydrate => {
            tracing::error!("Session still unhydrated after loading its profile");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Drops a session whose token the backend no longer accepts and clears its cookie.
fn revoke_session(state: &AppState, id: i64, jar: CookieJar, response: Response) -> Response {
    tracing::info!("Dropping session {}: backend rejected its token", id);
    if let Err(e) = auth::delete_session_by_id(&state.db, id) {
        tracing::warn!("Could not delete session {}: {}", id, e);
    }
    (jar.remove(expired_session_cookie()), response).into_response()
}
