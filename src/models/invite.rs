use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: i64,
    pub organization_id: i64,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewInvite {
    pub organization: i64,
    pub email: String,
    pub role: String,
}
