use crate::models::{Asset, AssetKind, NewAsset};
use crate::services::assets;
use crate::services::backend::{check_status, BackendClient, BackendError};
use crate::services::invalid;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/quicktime",
    "video/webm",
];

#[derive(Serialize)]
struct PresignRequest<'a> {
    filename: &'a str,
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
}

/// Determines the content type from the bytes, falling back to the file name.
pub fn detect_mime(original_name: &str, data: &[u8]) -> String {
    infer::get(data)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| {
            mime_guess::from_path(original_name)
                .first_or_octet_stream()
                .to_string()
        })
}

pub fn validate_upload(data: &[u8], mime_type: &str, max_bytes: usize) -> Result<()> {
    if data.is_empty() {
        invalid!("Uploaded file is empty");
    }
    if data.len() > max_bytes {
        invalid!(
            "File too large: {} bytes (max {} bytes)",
            data.len(),
            max_bytes
        );
    }
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        invalid!(
            "File type not allowed: {}. Allowed types: {}",
            mime_type,
            ALLOWED_MIME_TYPES.join(", ")
        );
    }
    Ok(())
}

/// Object key for the upload: a random name keeping the original extension.
pub fn storage_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_default();

    if extension.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}.{}", Uuid::new_v4(), extension)
    }
}

/// Sends a file to object storage through a pre-signed URL.
///
/// When `event_id` is given, the stored file is also registered as an asset
/// of that event.
pub async fn upload_file(
    backend: &BackendClient,
    token: &str,
    original_name: &str,
    data: Vec<u8>,
    max_bytes: usize,
    event_id: Option<i64>,
) -> Result<UploadOutcome> {
    let mime_type = detect_mime(original_name, &data);
    validate_upload(&data, &mime_type, max_bytes)?;

    let filename = storage_filename(original_name);
    let presigned: PresignedUpload = backend
        .post(
            "uploads/presign/",
            &PresignRequest {
                filename: &filename,
                content_type: &mime_type,
            },
            Some(token),
        )
        .await?;

    let size_bytes = data.len();
    let response = backend
        .http()
        .put(&presigned.upload_url)
        .header(reqwest::header::CONTENT_TYPE, &mime_type)
        .body(data)
        .send()
        .await?;
    check_status(response)
        .await
        .map_err(BackendError::into_gateway_error)?;

    tracing::info!(
        "Uploaded {} ({} bytes, {}) to {}",
        original_name,
        size_bytes,
        mime_type,
        presigned.file_url
    );

    let asset = match event_id {
        Some(event_id) => {
            let new_asset = NewAsset::from_upload(
                AssetKind::from_mime(&mime_type),
                presigned.file_url.clone(),
            );
            Some(assets::create_asset(backend, token, event_id, &new_asset).await?)
        }
        None => None,
    };

    Ok(UploadOutcome {
        url: presigned.file_url,
        content_type: mime_type,
        size_bytes,
        asset,
    })
}
