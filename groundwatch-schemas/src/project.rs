use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// The region a project belongs to: the part of its location before the first comma.
    pub fn region(&self) -> &str {
        let region = self.location.split(',').next().unwrap_or("").trim();
        if region.is_empty() {
            "Unknown"
        } else {
            region
        }
    }
}
