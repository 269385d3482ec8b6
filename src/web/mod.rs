mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{ApiError, AppError};
pub use extractors::AuthContext;
pub use state::AppState;

use crate::services::auth;
use crate::{Config, Database};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Builds the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::auth_only_routes(&state))
        .merge(routes::optional_routes(&state))
        .merge(routes::protected_routes(&state))
        .merge(routes::admin_routes(&state))
        .merge(routes::open_routes())
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db)?);

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        run_cleanup_job(cleanup_state).await;
    });

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Purges expired sessions and stale rate-limit entries once an hour.
async fn run_cleanup_job(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        match auth::cleanup_expired_sessions(&state.db) {
            Ok(0) => {}
            Ok(n) => tracing::info!("Removed {} expired sessions", n),
            Err(e) => tracing::error!("Session cleanup failed: {}", e),
        }
        state.rate_limiter.cleanup();
    }
}
