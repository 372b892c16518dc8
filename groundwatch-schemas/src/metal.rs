use serde::{Deserialize, Serialize};

fn default_analysis_method() -> String {
    "ICP-MS".to_string()
}

/// A single heavy metal measurement taken from a water sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalReading {
    pub metal_type: String,
    pub concentration_mg_l: f64,
    #[serde(default)]
    pub detection_limit: Option<f64>,
    #[serde(default = "default_analysis_method")]
    pub analysis_method: String,
}

impl MetalReading {
    pub fn new(metal_type: &str, concentration_mg_l: f64) -> Self {
        Self {
            metal_type: metal_type.to_string(),
            concentration_mg_l,
            detection_limit: None,
            analysis_method: default_analysis_method(),
        }
    }
}
