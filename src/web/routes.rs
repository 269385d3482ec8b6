use super::extractors::enforce;
use super::handlers;
use super::state::AppState;
use crate::services::guard::RouteRole;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Wraps every route of `router` in the access rule for `role`.
fn guarded(router: Router<Arc<AppState>>, state: &Arc<AppState>, role: RouteRole) -> Router<Arc<AppState>> {
    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        move |s: State<Arc<AppState>>, req: Request, next: Next| enforce(role, s, req, next),
    ))
}

pub fn auth_only_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let router = Router::new().route(
        "/login",
        get(handlers::auth::login_form).post(handlers::auth::login),
    );
    guarded(router, state, RouteRole::AuthOnly)
}

pub fn optional_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/e/:id", get(handlers::gallery::public_gallery_redirect))
        .route("/e/:id/:slug", get(handlers::gallery::public_gallery))
        .route("/e/:id/:slug/assets", get(handlers::gallery::public_assets))
        .route("/s/:hash", get(handlers::gallery::secret_gallery))
        .route("/s/:hash/assets", get(handlers::gallery::secret_assets))
        .route("/api/composite", post(handlers::proxy::composite));
    guarded(router, state, RouteRole::Optional)
}

pub fn protected_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route(
            "/events",
            get(handlers::events::index).post(handlers::events::create_event),
        )
        .route("/events/more", get(handlers::events::more))
        .route("/events/new", get(handlers::events::new_event))
        .route(
            "/events/:id",
            get(handlers::events::show_event).post(handlers::events::update_event),
        )
        .route("/events/:id/edit", get(handlers::events::edit_event))
        .route("/events/:id/assets", get(handlers::events::event_assets))
        .route("/assets/:id/like", post(handlers::assets::like))
        .route("/assets/:id/hide", post(handlers::assets::hide))
        .route("/assets/:id/unhide", post(handlers::assets::unhide))
        .route("/assets/:id/archive", post(handlers::assets::archive))
        .route("/api/generate", post(handlers::proxy::generate))
        .route("/api/generate/:id", get(handlers::proxy::generation_status))
        .route(
            "/api/uploads",
            post(handlers::proxy::upload).layer(DefaultBodyLimit::max(state.max_upload_bytes + 64 * 1024)),
        );
    guarded(router, state, RouteRole::Protected)
}

pub fn admin_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/admin/organizations", get(handlers::organizations::index))
        .route(
            "/admin/organizations/:id",
            post(handlers::organizations::update),
        )
        .route(
            "/admin/organizations/:id/edit",
            get(handlers::organizations::edit),
        )
        .route(
            "/admin/organizations/:id/invites",
            post(handlers::organizations::invite),
        )
        .route("/api/checkout", post(handlers::proxy::checkout));
    guarded(router, state, RouteRole::Admin)
}

/// Routes that manage the session themselves or need none.
pub fn open_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| async { axum::response::Redirect::to("/events") }))
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/api/session",
            post(handlers::auth::issue_session).delete(handlers::auth::revoke_session),
        )
        .route("/api/payments/webhook", post(handlers::proxy::payment_webhook))
        .route("/ui/banner/dismiss", post(handlers::ui::dismiss_banner))
        .route("/health", get(handlers::ui::health))
        .route("/static/*path", get(handlers::static_files::serve))
}
