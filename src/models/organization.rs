use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub seats: u32,
    #[serde(default)]
    pub seats_used: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
}

impl Organization {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.plan.features.iter().any(|f| f == feature)
    }

    pub fn seats_available(&self) -> u32 {
        self.plan.seats.saturating_sub(self.plan.seats_used)
    }
}

/// Fields an admin may change through `PUT /organizations/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationUpdate {
    pub name: String,
    pub plan: Plan,
}
