use crate::models::{Event, EventInput, Page};
use crate::services::backend::{BackendClient, BackendResult};
use crate::services::microsite;

pub async fn list_events(
    backend: &BackendClient,
    token: &str,
    organization_id: Option<i64>,
    cursor: Option<&str>,
) -> BackendResult<Page<Event>> {
    let mut filters = Vec::new();
    if let Some(org) = organization_id {
        filters.push(("organization", org.to_string()));
    }
    backend.get_page("events/", &filters, cursor, Some(token)).await
}

pub async fn get_event(backend: &BackendClient, token: &str, id: i64) -> BackendResult<Event> {
    backend.get(&format!("events/{}/", id), Some(token)).await
}

/// Public view of an event; the backend only answers for galleries that may
/// be shown without signing in.
pub async fn get_public_event(backend: &BackendClient, id: i64) -> BackendResult<Event> {
    backend.get(&format!("public/events/{}/", id), None).await
}

pub async fn create_event(backend: &BackendClient, token: &str, input: &EventInput) -> anyhow::Result<Event> {
    microsite::validate(&input.microsite)?;
    let event = backend.post("events/", input, Some(token)).await?;
    Ok(event)
}

pub async fn update_event(
    backend: &BackendClient,
    token: &str,
    id: i64,
    input: &EventInput,
) -> anyhow::Result<Event> {
    microsite::validate(&input.microsite)?;
    let event = backend
        .put(&format!("events/{}/", id), input, Some(token))
        .await?;
    Ok(event)
}
