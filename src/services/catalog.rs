use crate::models::{CustomModel, Filter, Page};
use crate::services::backend::{BackendClient, BackendResult};

pub async fn list_filters(
    backend: &BackendClient,
    token: &str,
    organization_id: Option<i64>,
    cursor: Option<&str>,
) -> BackendResult<Page<Filter>> {
    let filters: Vec<(&str, String)> = organization_id
        .map(|id| ("organization", id.to_string()))
        .into_iter()
        .collect();
    backend.get_page("filters/", &filters, cursor, Some(token)).await
}

pub async fn list_custom_models(
    backend: &BackendClient,
    token: &str,
    organization_id: Option<i64>,
    cursor: Option<&str>,
) -> BackendResult<Page<CustomModel>> {
    let filters: Vec<(&str, String)> = organization_id
        .map(|id| ("organization", id.to_string()))
        .into_iter()
        .collect();
    backend
        .get_page("custom-models/", &filters, cursor, Some(token))
        .await
}
