use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::path::PathBuf;

fn random_salt() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "Event Gallery".to_string());
    let config_path = path.join("eventdeck.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(path.join("data"))?;

    let config = format!(
        r#"[site]
title = "{}"
url = "http://localhost:3000"
language = "en"

[server]
host = "127.0.0.1"
port = 3000

[database]
path = "./data/sessions.db"

[backend]
base_url = "http://localhost:8000/api/"
timeout_secs = 30
page_size = 24
max_pages = 20

[auth]
session_lifetime = "7d"
secure_cookie = false

[uploads]
max_upload_size = "25MB"

[composite]
# Source images on private or loopback addresses are refused unless enabled.
allow_private_hosts = false

[slugs]
# Changing the salt invalidates every secret gallery link already shared.
salt = "{}"
min_length = 8

[ui]
error_reset_secs = 4

# [providers.image_generation]
# base_url = "https://api.example.com/v1"
# api_key = ""

# [providers.payments]
# base_url = "https://payments.example.com/v1"
# api_key = ""
# webhook_secret = ""
"#,
        site_name,
        random_salt()
    );

    std::fs::write(&config_path, config)?;

    tracing::info!("Created {:?}", config_path);
    tracing::info!("Set backend.base_url, then run 'eventdeck migrate' and 'eventdeck serve'");

    Ok(())
}
