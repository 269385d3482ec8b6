use serde::{Deserialize, Serialize};

/// Signed-in account as reported by the backend's `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub organization_id: Option<i64>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// A row of the local session store.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Cached profile; `None` until the session has been hydrated.
    pub user: Option<User>,
    pub expires_at: String,
}

impl Session {
    pub fn is_hydrated(&self) -> bool {
        self.user.is_some()
    }
}

/// Response of the backend login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}
