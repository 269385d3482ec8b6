use crate::models::{CaptureField, MicrositeConfig};
use crate::services::{invalid, InvalidInput};
use anyhow::Result;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

static HEX_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid hex color regex pattern")
});
static FIELD_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,49}$").expect("Invalid field name regex pattern"));

const MAX_LEGAL_TEXT: usize = 20_000;

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_REGEX.is_match(value)
}

/// Checks a microsite config before it is sent to the backend.
pub fn validate(config: &MicrositeConfig) -> Result<()> {
    if let Some(color) = config.primary_color.as_deref() {
        if !is_hex_color(color) {
            invalid!("Primary color must be a hex value such as #1a2b3c");
        }
    }
    for url in [&config.logo_url, &config.background_url].into_iter().flatten() {
        let parsed = url::Url::parse(url).map_err(|_| InvalidInput(format!("Invalid image URL: {}", url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            invalid!("Image URLs must use http or https");
        }
    }
    let mut seen = Vec::new();
    for field in &config.capture_fields {
        if !FIELD_NAME_REGEX.is_match(&field.name) {
            invalid!(
                "Capture field '{}' must be lowercase letters, digits or underscores",
                field.name
            );
        }
        if seen.contains(&field.name.as_str()) {
            invalid!("Capture field '{}' is listed twice", field.name);
        }
        seen.push(field.name.as_str());
    }
    if config.legal_text.as_deref().map_or(0, str::len) > MAX_LEGAL_TEXT {
        invalid!("Legal text must be {} characters or less", MAX_LEGAL_TEXT);
    }
    Ok(())
}

/// Parses the "one field per line" textarea of the event form.
///
/// Each line is `name`, `name|Label` or `name|Label|required`.
pub fn parse_capture_fields(input: &str) -> Vec<CaptureField> {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let mut parts = line.split('|').map(str::trim);
            let name = parts.next().unwrap_or_default().to_lowercase();
            let label = parts
                .next()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| name.replace('_', " "));
            let required = parts.next().is_some_and(|r| r.eq_ignore_ascii_case("required"));
            CaptureField {
                name,
                label,
                required,
            }
        })
        .collect()
}

pub fn format_capture_fields(fields: &[CaptureField]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.required {
                format!("{}|{}|required", f.name, f.label)
            } else {
                format!("{}|{}", f.name, f.label)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSS custom properties for a gallery page.
pub fn css_variables(config: &MicrositeConfig) -> String {
    let mut vars = Vec::new();

    if let Some(color) = config.primary_color.as_deref().filter(|c| is_hex_color(c)) {
        vars.push(format!("--color-primary: {};", color));
        if color.len() == 7 {
            vars.push(format!("--color-primary-light: {}1a;", color));
        }
    }
    if let Some(bg) = config.background_url.as_deref() {
        vars.push(format!("--gallery-background: url(\"{}\");", css_escape(bg)));
    }

    vars.join("\n    ")
}

fn css_escape(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '\n' | '\r' | '<' | '>'))
        .collect()
}

/// Renders the legal text markdown to sanitized HTML.
pub fn render_legal_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);

    ammonia::Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(&out)
        .to_string()
}
