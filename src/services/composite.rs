//! Overlaying one image on another.
//!
//! The overlay is scaled to the base image's size and blended pixel by
//! pixel. Blend math works on straight (non-premultiplied) RGBA in `0.0..=1.0`.

use crate::config::CompositeConfig;
use crate::services::{invalid, InvalidInput};
use anyhow::Result;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use url::{Host, Url};

/// Largest absolute difference between two aspect ratios still treated as equal.
pub const ASPECT_RATIO_EPSILON: f64 = 0.01;

const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

impl FromStr for BlendMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "source-over" => Ok(Self::Normal),
            "multiply" => Ok(Self::Multiply),
            "screen" => Ok(Self::Screen),
            "overlay" => Ok(Self::Overlay),
            "darken" => Ok(Self::Darken),
            "lighten" => Ok(Self::Lighten),
            _ => Err(()),
        }
    }
}

impl BlendMode {
    /// Parses a mode name, using [`BlendMode::Normal`] for anything unknown.
    pub fn parse_or_default(name: Option<&str>) -> Self {
        match name {
            Some(n) => n.parse().unwrap_or_else(|_| {
                tracing::debug!("Unknown blend mode '{}', using normal", n);
                Self::Normal
            }),
            None => Self::Normal,
        }
    }

    fn channel(self, base: f32, top: f32) -> f32 {
        match self {
            Self::Normal => top,
            Self::Multiply => base * top,
            Self::Screen => 1.0 - (1.0 - base) * (1.0 - top),
            Self::Overlay => {
                if base <= 0.5 {
                    2.0 * base * top
                } else {
                    1.0 - 2.0 * (1.0 - base) * (1.0 - top)
                }
            }
            Self::Darken => base.min(top),
            Self::Lighten => base.max(top),
        }
    }
}

/// True when `width / height` is within [`ASPECT_RATIO_EPSILON`] of `expected`,
/// boundary included.
pub fn aspect_ratio_matches(width: u32, height: u32, expected: f64) -> bool {
    if width == 0 || height == 0 || expected <= 0.0 {
        return false;
    }
    let ratio = width as f64 / height as f64;
    // Absorbs the rounding of the division so exact-boundary ratios pass.
    let slack = 4.0 * f64::EPSILON * ratio.max(expected).max(1.0);
    (ratio - expected).abs() <= ASPECT_RATIO_EPSILON + slack
}

/// Blends a single pixel of `top` over `base`.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode) -> Rgba<u8> {
    let to_f = |v: u8| v as f32 / 255.0;
    let ab = to_f(base[3]);
    let at = to_f(top[3]);

    let out_alpha = at + ab * (1.0 - at);
    if out_alpha <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let cb = to_f(base[i]);
        let ct = to_f(top[i]);
        // Where the base is transparent the top colour shows unblended.
        let mixed = (1.0 - ab) * ct + ab * mode.channel(cb, ct);
        let c = (at * mixed + ab * cb * (1.0 - at)) / out_alpha;
        out[i] = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out[3] = (out_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba(out)
}

/// Scales `overlay` to `width`x`height`.
///
/// Matching aspect ratios are stretched exactly; otherwise the overlay is
/// scaled to cover and centre-cropped.
pub fn fit_overlay(overlay: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (ow, oh) = overlay.dimensions();
    if (ow, oh) == (width, height) {
        return overlay.clone();
    }
    let target = width as f64 / height as f64;
    if aspect_ratio_matches(ow, oh, target) {
        overlay.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        overlay.resize_to_fill(width, height, FilterType::Lanczos3)
    }
}

pub fn composite(base: &DynamicImage, overlay: &DynamicImage, mode: BlendMode) -> RgbaImage {
    let (width, height) = base.dimensions();
    let overlay = fit_overlay(overlay, width, height).to_rgba8();
    let mut out = base.to_rgba8();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        *pixel = blend_pixel(*pixel, *overlay.get_pixel(x, y), mode);
    }

    out
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || w > MAX_DIMENSION || h > MAX_DIMENSION {
        invalid!("Image dimensions {}x{} are out of range", w, h);
    }
    Ok(img)
}

/// Composites two in-memory images and returns PNG bytes.
pub fn composite_bytes(base: &[u8], overlay: &[u8], mode: BlendMode) -> Result<Vec<u8>> {
    let base = decode_image(base)?;
    let overlay = decode_image(overlay)?;
    encode_png(&composite(&base, &overlay, mode))
}

/// Where composite source images may come from and how much is read.
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    pub allow_private_hosts: bool,
    pub max_bytes: usize,
    pub timeout: Duration,
}

impl SourcePolicy {
    pub fn from_config(config: &CompositeConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            allow_private_hosts: config.allow_private_hosts,
            max_bytes: config.max_source_bytes()?,
            timeout,
        })
    }
}

/// False for loopback, private, link-local and other non-routable addresses.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_v4(v4);
            }
            let [first, second, ..] = v6.segments();
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || (first == 0x2001 && second == 0x0db8))
        }
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (b & 0xc0) == 64)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b & 0xfe) == 18))
}

async fn resolve_source(url: &Url, policy: &SourcePolicy) -> Result<Vec<SocketAddr>> {
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs: Vec<SocketAddr> = match url.host() {
        Some(Host::Ipv4(ip)) => vec![SocketAddr::new(IpAddr::V4(ip), port)],
        Some(Host::Ipv6(ip)) => vec![SocketAddr::new(IpAddr::V6(ip), port)],
        Some(Host::Domain(domain)) => tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| InvalidInput(format!("Could not resolve image host {}: {}", domain, e)))?
            .collect(),
        None => invalid!("Image URL has no host"),
    };
    if addrs.is_empty() {
        invalid!("Image host {} did not resolve", url.host_str().unwrap_or_default());
    }
    if !policy.allow_private_hosts && addrs.iter().any(|addr| !is_public_ip(addr.ip())) {
        tracing::warn!("Refusing composite source on a non-public address: {}", url);
        invalid!(
            "Image host {} is not publicly reachable",
            url.host_str().unwrap_or_default()
        );
    }
    Ok(addrs)
}

/// Downloads one source image.
///
/// The connection is pinned to the addresses checked against `policy`, and
/// redirects are not followed. Upstream error bodies are never passed back.
pub async fn fetch_image(policy: &SourcePolicy, url: &str) -> Result<Vec<u8>> {
    let parsed = Url::parse(url).map_err(|_| InvalidInput(format!("Invalid image URL: {}", url)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        invalid!("Image URLs must use http or https");
    }
    let addrs = resolve_source(&parsed, policy).await?;

    let mut builder = reqwest::Client::builder()
        .timeout(policy.timeout)
        .redirect(reqwest::redirect::Policy::none());
    if let Some(domain) = parsed.domain() {
        builder = builder.resolve_to_addrs(domain, &addrs);
    }
    let http = builder.build()?;

    let mut response = http.get(parsed).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Composite source {} responded {}", url, status);
        invalid!("Could not fetch image: source responded {}", status);
    }
    if response
        .content_length()
        .is_some_and(|len| len > policy.max_bytes as u64)
    {
        invalid!("Image at {} is larger than {} bytes", url, policy.max_bytes);
    }

    let mut data = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if data.len() + chunk.len() > policy.max_bytes {
            invalid!("Image at {} is larger than {} bytes", url, policy.max_bytes);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Fetches both images and composites them.
pub async fn composite_urls(
    policy: &SourcePolicy,
    base_url: &str,
    overlay_url: &str,
    mode: BlendMode,
) -> Result<Vec<u8>> {
    let (base, overlay) = tokio::try_join!(fetch_image(policy, base_url), fetch_image(policy, overlay_url))?;
    tokio::task::spawn_blocking(move || composite_bytes(&base, &overlay, mode)).await?
}
