use crate::models::Asset;
use crate::services::assets;
use crate::web::error::ApiResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;

pub async fn like(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Asset>> {
    let asset = assets::like_asset(&state.backend, auth.token(), id).await?;
    Ok(Json(asset))
}

pub async fn hide(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Asset>> {
    let asset = assets::set_hidden(&state.backend, auth.token(), id, true).await?;
    tracing::info!("Asset {} hidden by user {}", id, auth.user.id);
    Ok(Json(asset))
}

pub async fn unhide(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Asset>> {
    let asset = assets::set_hidden(&state.backend, auth.token(), id, false).await?;
    tracing::info!("Asset {} unhidden by user {}", id, auth.user.id);
    Ok(Json(asset))
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Asset>> {
    let asset = assets::archive_asset(&state.backend, auth.token(), id).await?;
    tracing::info!("Asset {} archived by user {}", id, auth.user.id);
    Ok(Json(asset))
}
