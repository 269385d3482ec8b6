use crate::services::auth;
use crate::services::backend::BackendClient;
use crate::services::hashid::HashIds;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

#[derive(Debug)]
enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "\x1b[32m✓ OK\x1b[0m"),
            CheckStatus::Warn => write!(f, "\x1b[33m⚠ WARN\x1b[0m"),
            CheckStatus::Fail => write!(f, "\x1b[31m✗ FAIL\x1b[0m"),
        }
    }
}

struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

pub async fn run(config_path: &Path) -> Result<()> {
    println!("\n  eventdeck check\n");

    let mut results = Vec::new();

    let config = match Config::load(config_path) {
        Ok(config) => {
            results.push(CheckResult::new(
                "Configuration",
                CheckStatus::Ok,
                format!("Loaded from {}", config_path.display()),
            ));
            config
        }
        Err(e) => {
            results.push(CheckResult::new("Configuration", CheckStatus::Fail, e.to_string()));
            return finish(&results);
        }
    };

    results.push(check_database(&config));
    results.push(check_slugs(&config));
    results.push(check_backend(&config).await);

    for (name, provider) in [
        ("Image generation", config.providers.image_generation.as_ref()),
        ("Payments", config.providers.payments.as_ref()),
    ] {
        let result = match provider {
            Some(p) => CheckResult::new(name, CheckStatus::Ok, p.base_url.clone()),
            None => CheckResult::new(name, CheckStatus::Warn, "Not configured, endpoints return 503"),
        };
        results.push(result);
    }

    if let Some(payments) = &config.providers.payments {
        if payments.webhook_secret.is_none() {
            results.push(CheckResult::new(
                "Payment webhooks",
                CheckStatus::Warn,
                "No webhook_secret, webhooks will be refused",
            ));
        }
    }

    if !config.auth.secure_cookie && config.site.url.starts_with("https://") {
        results.push(CheckResult::new(
            "Session cookie",
            CheckStatus::Warn,
            "Site is served over https but auth.secure_cookie is false",
        ));
    }

    finish(&results)
}

fn check_database(config: &Config) -> CheckResult {
    let db = match Database::open(&config.database.path) {
        Ok(db) => db,
        Err(e) => return CheckResult::new("Session store", CheckStatus::Fail, format!("Cannot open: {}", e)),
    };
    match (db.health_check(), db.schema_version()) {
        (Ok(true), Ok(version)) if version >= Database::latest_version() => {
            let sessions = auth::count_sessions(&db).unwrap_or(0);
            CheckResult::new(
                "Session store",
                CheckStatus::Ok,
                format!("{} ({} active sessions)", config.database.path, sessions),
            )
        }
        (Ok(true), Ok(version)) => CheckResult::new(
            "Session store",
            CheckStatus::Warn,
            format!("Schema version {} is behind, run 'eventdeck migrate'", version),
        ),
        (Err(e), _) | (_, Err(e)) => CheckResult::new("Session store", CheckStatus::Fail, e.to_string()),
        _ => CheckResult::new("Session store", CheckStatus::Fail, "Health check returned an unexpected result"),
    }
}

fn check_slugs(config: &Config) -> CheckResult {
    match HashIds::from_config(&config.slugs) {
        Ok(hashids) => CheckResult::new(
            "Gallery slugs",
            CheckStatus::Ok,
            format!("id 1 encodes to {}", hashids.encode(1)),
        ),
        Err(e) => CheckResult::new("Gallery slugs", CheckStatus::Fail, e.to_string()),
    }
}

async fn check_backend(config: &Config) -> CheckResult {
    let backend = match BackendClient::new(&config.backend) {
        Ok(b) => b,
        Err(e) => return CheckResult::new("Backend API", CheckStatus::Fail, e.to_string()),
    };
    let url = match backend.url("health/") {
        Ok(url) => url,
        Err(e) => return CheckResult::new("Backend API", CheckStatus::Fail, e.to_string()),
    };
    match backend.http().get(url.clone()).send().await {
        Ok(resp) if resp.status().is_success() => {
            CheckResult::new("Backend API", CheckStatus::Ok, format!("{} reachable", url))
        }
        Ok(resp) => CheckResult::new(
            "Backend API",
            CheckStatus::Warn,
            format!("{} answered {}", url, resp.status()),
        ),
        Err(e) => CheckResult::new("Backend API", CheckStatus::Fail, format!("{}: {}", url, e)),
    }
}

fn finish(results: &[CheckResult]) -> Result<()> {
    print_results(results);
    let failures = results
        .iter()
        .filter(|r| matches!(r.status, CheckStatus::Fail))
        .count();
    if failures > 0 {
        println!("\n  \x1b[31mSome checks failed. Fix the issues above before serving.\x1b[0m\n");
        anyhow::bail!("{} check(s) failed", failures);
    }
    println!("\n  \x1b[32mAll checks passed.\x1b[0m\n");
    Ok(())
}

fn print_results(results: &[CheckResult]) {
    let max_name_len = results.iter().map(|r| r.name.len()).max().unwrap_or(20);

    for (i, result) in results.iter().enumerate() {
        println!(
            "  {:>2}. {:<width$}  {}  {}",
            i + 1,
            result.name,
            result.status,
            result.detail,
            width = max_name_len,
        );
    }
}
