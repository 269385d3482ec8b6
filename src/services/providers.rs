//! Pass-through clients for the image generation and payment providers.

use crate::config::ProviderConfig;
use crate::services::backend::{check_status, BackendError, BackendResult};
use crate::services::invalid;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ProviderClient {
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> BackendResult<Value> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let response = check_status(response)
            .await
            .map_err(BackendError::into_gateway_error)?;
        Ok(response.json().await?)
    }

    pub async fn get_json(&self, path: &str) -> BackendResult<Value> {
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = check_status(response)
            .await
            .map_err(BackendError::into_gateway_error)?;
        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Starts an image generation job and returns the provider's response.
pub async fn start_generation(client: &ProviderClient, request: &GenerationRequest) -> anyhow::Result<Value> {
    if request.prompt.trim().is_empty() {
        invalid!("Prompt cannot be empty");
    }
    Ok(client.post_json("predictions", request).await?)
}

pub async fn generation_status(client: &ProviderClient, id: &str) -> anyhow::Result<Value> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        invalid!("Invalid prediction id");
    }
    Ok(client.get_json(&format!("predictions/{}", id)).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub organization_id: i64,
}

#[derive(Serialize)]
struct CheckoutSession<'a> {
    price: &'a str,
    client_reference_id: String,
    success_url: String,
    cancel_url: String,
}

/// Opens a hosted checkout session and returns the URL to send the user to.
pub async fn create_checkout(
    client: &ProviderClient,
    request: &CheckoutRequest,
    site_url: &str,
) -> anyhow::Result<String> {
    if request.price_id.trim().is_empty() {
        invalid!("price_id is required");
    }
    let site_url = site_url.trim_end_matches('/');
    let body = CheckoutSession {
        price: &request.price_id,
        client_reference_id: request.organization_id.to_string(),
        success_url: format!(
            "{}/admin/organizations/{}/edit?checkout=success",
            site_url, request.organization_id
        ),
        cancel_url: format!(
            "{}/admin/organizations/{}/edit?checkout=cancelled",
            site_url, request.organization_id
        ),
    };
    let session = client.post_json("checkout/sessions", &body).await?;
    session
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Payment provider returned no checkout url"))
}

pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Checks an `sha256=<hex>` signature header in constant time.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> bool {
    let Some(hex_sig) = header.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
