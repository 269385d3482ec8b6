use serde::{Deserialize, Serialize};

/// Overlay applied to booth captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overlay_url: Option<String>,
    #[serde(default)]
    pub blend_mode: Option<String>,
}

/// Fine-tuned image generation model registered for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub provider_model: Option<String>,
    #[serde(default)]
    pub status: String,
}
