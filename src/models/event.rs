use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Email,
    Sms,
    Qr,
    #[default]
    #[serde(other)]
    None,
}

impl FromStr for DeliveryMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "qr" => Ok(Self::Qr),
            "none" | "" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Sms => write!(f, "sms"),
            Self::Qr => write!(f, "qr"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

/// Branding of an event's public gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrositeConfig {
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub background_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub capture_fields: Vec<CaptureField>,
    #[serde(default)]
    pub legal_text: Option<String>,
    #[serde(default)]
    pub enable_likes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub delivery: DeliveryMode,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub microsite: MicrositeConfig,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body sent to the backend when creating or editing an event.
#[derive(Debug, Clone, Serialize)]
pub struct EventInput {
    pub name: String,
    pub is_private: bool,
    pub delivery: DeliveryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    pub microsite: MicrositeConfig,
}
