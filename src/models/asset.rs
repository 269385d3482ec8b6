use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Photo,
    Video,
    Gif,
}

impl AssetKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime == "image/gif" {
            Self::Gif
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Photo
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub event_id: i64,
    #[serde(default)]
    pub kind: AssetKind,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub gif_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Asset {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn liked_by(&self, user_id: i64) -> bool {
        self.likes.iter().any(|l| l.user_id == Some(user_id))
    }

    /// Best URL to show for this asset's kind, falling back through the variants.
    pub fn display_url(&self) -> Option<&str> {
        let preferred = match self.kind {
            AssetKind::Video => self.video_url.as_deref(),
            AssetKind::Gif => self.gif_url.as_deref(),
            AssetKind::Photo => self.image_url.as_deref(),
        };
        preferred
            .or(self.image_url.as_deref())
            .or(self.thumbnail_url.as_deref())
            .or(self.gif_url.as_deref())
            .or(self.video_url.as_deref())
    }
}

/// Body used to register an uploaded file as an event asset.
#[derive(Debug, Clone, Serialize)]
pub struct NewAsset {
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
}

impl NewAsset {
    pub fn from_upload(kind: AssetKind, file_url: String) -> Self {
        let mut asset = Self {
            kind,
            image_url: None,
            video_url: None,
            gif_url: None,
        };
        match kind {
            AssetKind::Photo => asset.image_url = Some(file_url),
            AssetKind::Video => asset.video_url = Some(file_url),
            AssetKind::Gif => asset.gif_url = Some(file_url),
        }
        asset
    }
}
