use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub composite: CompositeConfig,
    pub slugs: SlugConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Page size requested from paginated list endpoints
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on pages fetched when a view needs a whole collection
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime: String,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime: default_session_lifetime(),
            secure_cookie: false,
        }
    }
}

impl AuthConfig {
    pub fn session_duration(&self) -> Result<Duration> {
        parse_duration(&self.session_lifetime)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload")]
    pub max_upload_size: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload(),
        }
    }
}

impl UploadConfig {
    pub fn max_bytes(&self) -> Result<usize> {
        parse_size(&self.max_upload_size)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompositeConfig {
    /// Allow source images on loopback, private and link-local addresses
    #[serde(default)]
    pub allow_private_hosts: bool,
    #[serde(default = "default_max_upload")]
    pub max_source_size: String,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            allow_private_hosts: false,
            max_source_size: default_max_upload(),
        }
    }
}

impl CompositeConfig {
    pub fn max_source_bytes(&self) -> Result<usize> {
        parse_size(&self.max_source_size)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlugConfig {
    pub salt: String,
    #[serde(default = "default_slug_min_length")]
    pub min_length: usize,
    #[serde(default = "default_slug_alphabet")]
    pub alphabet: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub image_generation: Option<ProviderConfig>,
    #[serde(default)]
    pub payments: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Seconds before a flashed error message clears itself
    #[serde(default = "default_error_reset_secs")]
    pub error_reset_secs: u64,
    #[serde(default)]
    pub banner: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            error_reset_secs: default_error_reset_secs(),
            banner: None,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_pool_size() -> u32 {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    24
}

fn default_max_pages() -> usize {
    20
}

fn default_session_lifetime() -> String {
    "7d".to_string()
}

fn default_max_upload() -> String {
    "25MB".to_string()
}

fn default_slug_min_length() -> usize {
    8
}

fn default_slug_alphabet() -> String {
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890".to_string()
}

fn default_error_reset_secs() -> u64 {
    4
}

/// Parses sizes such as `"512KB"`, `"25MB"`, `"1GB"` or a bare byte count.
pub fn parse_size(value: &str) -> Result<usize> {
    let value = value.trim();
    let upper = value.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let amount: usize = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size '{}'", value))?;
    amount
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size '{}' is too large", value))
}

/// Parses durations such as `"30m"`, `"12h"` or `"7d"`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let Some((split, unit)) = value.char_indices().last() else {
        anyhow::bail!("Invalid duration '{}'", value);
    };
    let amount: u64 = value[..split]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration '{}'", value))?;
    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 60 * 60 * 24,
        _ => anyhow::bail!("Invalid duration unit in '{}' (use s, m, h or d)", value),
    };
    let secs = amount
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Duration '{}' is too large", value))?;
    Ok(Duration::from_secs(secs))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'eventdeck init' to create one.",
                path.display(),
                e
            )
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.backend.base_url)
            .map_err(|e| anyhow::anyhow!("backend.base_url is not a valid URL: {}", e))?;
        if self.backend.page_size == 0 || self.backend.page_size > 200 {
            anyhow::bail!("backend.page_size must be between 1 and 200");
        }
        if self.backend.max_pages == 0 {
            anyhow::bail!("backend.max_pages must be greater than 0");
        }
        if self.slugs.salt.is_empty() {
            anyhow::bail!("slugs.salt must not be empty");
        }
        if self.slugs.min_length > 64 {
            anyhow::bail!("slugs.min_length must be 64 or less");
        }
        if self.auth.session_duration()? > MAX_SESSION_LIFETIME {
            anyhow::bail!("auth.session_lifetime must be 365d or less");
        }
        self.uploads.max_bytes()?;
        self.composite.max_source_bytes()?;
        for provider in [&self.providers.image_generation, &self.providers.payments]
            .into_iter()
            .flatten()
        {
            url::Url::parse(&provider.base_url)
                .map_err(|e| anyhow::anyhow!("provider base_url is not a valid URL: {}", e))?;
        }
        Ok(())
    }
}
