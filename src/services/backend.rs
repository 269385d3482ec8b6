//! HTTP client for the gallery backend REST API.
//!
//! Every call is a single request with the caller's bearer token. Non-2xx
//! responses become [`BackendError::Status`] carrying the upstream status and
//! the best message that could be extracted from the body, so the web layer
//! can pass it through.

use crate::config::BackendConfig;
use crate::models::Page;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("cursor does not point at the backend: {0}")]
    ForeignCursor(String),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Url(_) | Self::ForeignCursor(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    /// Reports an auth failure as a bad gateway.
    ///
    /// For calls made without the user's bearer token, where a 401 or 403
    /// says nothing about the signed-in session.
    pub fn into_gateway_error(self) -> Self {
        match self {
            Self::Status { status, message }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                Self::Status {
                    status: StatusCode::BAD_GATEWAY,
                    message,
                }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Message suitable for showing to the user or passing through a proxy.
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    page_size: usize,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("eventdeck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, &config.base_url, config.page_size)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, page_size: usize) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            base,
            page_size,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolves an API path such as `events/12/` against the base URL.
    pub fn url(&self, path: &str) -> BackendResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> BackendResult<T> {
        let url = self.url(path)?;
        send_json(self.request(Method::GET, url, token)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q, token: Option<&str>) -> BackendResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        send_json(self.request(Method::GET, url, token).query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> BackendResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        send_json(self.request(Method::POST, url, token).json(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, token: Option<&str>) -> BackendResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        send_json(self.request(Method::PUT, url, token).json(body)).await
    }

    /// POST whose response body is ignored.
    pub async fn post_empty<B>(&self, path: &str, body: &B, token: Option<&str>) -> BackendResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let response = self.request(Method::POST, url, token).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Fetches one page of a cursor-paginated listing.
    ///
    /// A cursor that is an absolute URL is followed as-is, provided it stays
    /// on the backend's origin; anything else is sent as the `cursor` query
    /// parameter of `path`.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &[(&str, String)],
        cursor: Option<&str>,
        token: Option<&str>,
    ) -> BackendResult<Page<T>> {
        if let Some(cursor) = cursor.filter(|c| is_absolute(c)) {
            let url = Url::parse(cursor)?;
            if url.origin() != self.base.origin() {
                return Err(BackendError::ForeignCursor(cursor.to_string()));
            }
            return send_json(self.request(Method::GET, url, token)).await;
        }

        let mut query: Vec<(&str, String)> = Vec::with_capacity(filters.len() + 2);
        query.push(("page_size", self.page_size.to_string()));
        query.extend(filters.iter().cloned());
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.to_string()));
        }
        self.get_with_query(path, &query, token).await
    }
}

fn is_absolute(cursor: &str) -> bool {
    cursor.starts_with("http://") || cursor.starts_with("https://")
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> BackendResult<T> {
    let response = check_status(builder.send().await?).await?;
    Ok(response.json::<T>().await?)
}

/// Turns a non-2xx response into [`BackendError::Status`].
pub async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Upstream request failed")
            .to_string()
    });
    tracing::warn!("Upstream responded {}: {}", status, message);
    Err(BackendError::Status { status, message })
}

/// Pulls a human readable message out of an upstream error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}`, `{"message": ..}`,
/// `{"error": {"message": ..}}` and falls back to the raw text when short.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(serde_json::Value::Object(obj)) => {
                    if let Some(serde_json::Value::String(s)) = obj.get("message") {
                        return Some(s.clone());
                    }
                }
                _ => {}
            }
        }
        return None;
    }
    if trimmed.len() <= 200 {
        Some(trimmed.to_string())
    } else {
        None
    }
}
