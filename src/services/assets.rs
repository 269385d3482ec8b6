use crate::models::{Asset, NewAsset, Page};
use crate::services::backend::{BackendClient, BackendResult};
use serde_json::json;

/// Assets of an event as seen by its owner, hidden ones included.
pub async fn list_event_assets(
    backend: &BackendClient,
    token: &str,
    event_id: i64,
    cursor: Option<&str>,
) -> BackendResult<Page<Asset>> {
    let filters = [("include_hidden", "true".to_string())];
    backend
        .get_page(
            &format!("events/{}/assets/", event_id),
            &filters,
            cursor,
            Some(token),
        )
        .await
}

/// Publicly visible assets of an event.
pub async fn list_public_assets(
    backend: &BackendClient,
    event_id: i64,
    cursor: Option<&str>,
) -> BackendResult<Page<Asset>> {
    backend
        .get_page(
            &format!("public/events/{}/assets/", event_id),
            &[],
            cursor,
            None,
        )
        .await
}

pub async fn create_asset(
    backend: &BackendClient,
    token: &str,
    event_id: i64,
    asset: &NewAsset,
) -> BackendResult<Asset> {
    backend
        .post(&format!("events/{}/assets/", event_id), asset, Some(token))
        .await
}

pub async fn like_asset(backend: &BackendClient, token: &str, asset_id: i64) -> BackendResult<Asset> {
    backend
        .post(&format!("assets/{}/like/", asset_id), &json!({}), Some(token))
        .await
}

pub async fn set_hidden(
    backend: &BackendClient,
    token: &str,
    asset_id: i64,
    hidden: bool,
) -> BackendResult<Asset> {
    backend
        .post(
            &format!("assets/{}/hide/", asset_id),
            &json!({ "hidden": hidden }),
            Some(token),
        )
        .await
}

pub async fn archive_asset(backend: &BackendClient, token: &str, asset_id: i64) -> BackendResult<Asset> {
    backend
        .post(&format!("assets/{}/archive/", asset_id), &json!({}), Some(token))
        .await
}
