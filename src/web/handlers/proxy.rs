//! JSON endpoints that forward to third-party services.

use crate::services::composite::{self, BlendMode};
use crate::services::providers::{self, CheckoutRequest, GenerationRequest, ProviderClient, SIGNATURE_HEADER};
use crate::services::upload::{self, UploadOutcome};
use crate::web::error::{ApiError, ApiResult};
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

fn provider<'a>(client: &'a Option<ProviderClient>, name: &str) -> ApiResult<&'a ProviderClient> {
    client.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{} is not configured", name),
        )
    })
}

/// POST /api/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Json(request): Json<GenerationRequest>,
) -> ApiResult<Json<Value>> {
    let client = provider(&state.image_generation, "Image generation")?;
    let prediction = providers::start_generation(client, &request).await?;
    tracing::info!("User {} started an image generation", auth.user.id);
    Ok(Json(prediction))
}

/// GET /api/generate/:id
pub async fn generation_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(_auth): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let client = provider(&state.image_generation, "Image generation")?;
    Ok(Json(providers::generation_status(client, &id).await?))
}

/// POST /api/checkout
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<Value>> {
    let client = provider(&state.payments, "Payments")?;
    let url = providers::create_checkout(client, &request, &state.config.site.url).await?;
    tracing::info!(
        "User {} opened checkout for organization {}",
        auth.user.id,
        request.organization_id
    );
    Ok(Json(serde_json::json!({ "url": url })))
}

/// POST /api/payments/webhook: verified locally, then relayed to the backend.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let secret = state
        .config
        .providers
        .payments
        .as_ref()
        .and_then(|p| p.webhook_secret.as_deref())
        .ok_or_else(|| ApiError::not_found("Webhooks are not configured"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !providers::verify_signature(secret, &body, signature) {
        tracing::warn!("Rejected payment webhook with a bad signature");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid signature"));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;
    state
        .backend
        .post_empty("billing/events/", &payload, None)
        .await?;

    let kind = payload.get("type").and_then(Value::as_str).unwrap_or("unknown");
    tracing::info!("Relayed payment event {}", kind);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CompositeRequest {
    image_url: String,
    overlay_url: String,
    #[serde(default)]
    blend_mode: Option<String>,
}

/// POST /api/composite: returns the composed image as PNG.
pub async fn composite(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompositeRequest>,
) -> ApiResult<Response> {
    let mode = BlendMode::parse_or_default(request.blend_mode.as_deref());
    let png = composite::composite_urls(
        &state.image_sources,
        &request.image_url,
        &request.overlay_url,
        mode,
    )
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// POST /api/uploads: multipart `file` plus optional `event_id`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadOutcome>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut event_id: Option<i64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                file = Some((name, data.to_vec()));
            }
            "event_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                if !raw.trim().is_empty() {
                    event_id = Some(
                        raw.trim()
                            .parse()
                            .map_err(|_| ApiError::bad_request("event_id must be a number"))?,
                    );
                }
            }
            _ => {}
        }
    }

    let (name, data) = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let outcome = upload::upload_file(
        &state.backend,
        auth.token(),
        &name,
        data,
        state.max_upload_bytes,
        event_id,
    )
    .await?;

    Ok(Json(outcome))
}
