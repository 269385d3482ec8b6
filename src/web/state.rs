use crate::services::backend::BackendClient;
use crate::services::composite::SourcePolicy;
use crate::services::hashid::HashIds;
use crate::services::providers::ProviderClient;
use crate::web::security::{CsrfManager, RateLimiter};
use crate::{Config, Database};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tera::{Tera, Value};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub backend: BackendClient,
    pub image_generation: Option<ProviderClient>,
    pub payments: Option<ProviderClient>,
    pub templates: Tera,
    pub hashids: HashIds,
    pub session_lifetime: Duration,
    pub max_upload_bytes: usize,
    pub image_sources: SourcePolicy,
    pub csrf: Arc<CsrfManager>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let backend = BackendClient::new(&config.backend)?;
        let provider_http = reqwest::Client::builder()
            .timeout(config.backend.timeout())
            .build()?;
        let image_generation = config
            .providers
            .image_generation
            .as_ref()
            .map(|p| ProviderClient::new(provider_http.clone(), p));
        let payments = config
            .providers
            .payments
            .as_ref()
            .map(|p| ProviderClient::new(provider_http.clone(), p));

        let mut templates = Tera::default();
        templates.register_filter("format_date", format_date_filter);
        templates.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html")),
            ("auth/login.html", include_str!("../../templates/auth/login.html")),
            ("events/index.html", include_str!("../../templates/events/index.html")),
            ("events/form.html", include_str!("../../templates/events/form.html")),
            ("events/detail.html", include_str!("../../templates/events/detail.html")),
            ("gallery/show.html", include_str!("../../templates/gallery/show.html")),
            ("gallery/assets.html", include_str!("../../templates/gallery/assets.html")),
            ("organizations/index.html", include_str!("../../templates/organizations/index.html")),
            ("organizations/form.html", include_str!("../../templates/organizations/form.html")),
            ("error.html", include_str!("../../templates/error.html")),
        ])?;

        let hashids = HashIds::from_config(&config.slugs)?;
        let session_lifetime = config.auth.session_duration()?;
        let max_upload_bytes = config.uploads.max_bytes()?;
        let image_sources = SourcePolicy::from_config(&config.composite, config.backend.timeout())?;

        Ok(Self {
            config,
            db,
            backend,
            image_generation,
            payments,
            templates,
            hashids,
            session_lifetime,
            max_upload_bytes,
            image_sources,
            csrf: Arc::new(CsrfManager),
            rate_limiter: Arc::new(RateLimiter::default()),
        })
    }
}

fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let date_str = match value.as_str() {
        Some(s) => s,
        None => return Ok(value.clone()),
    };

    let format = args
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("%B %d, %Y");

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    Ok(Value::String(date_str.to_string()))
}
