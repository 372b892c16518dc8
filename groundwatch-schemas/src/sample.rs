use crate::metal::MetalReading;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A groundwater sample with its physicochemical parameters and metal readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSample {
    pub sample_id: String,
    pub project_id: String,
    pub sample_name: String,
    pub collection_date: NaiveDate,
    #[serde(default)]
    pub collection_time: Option<NaiveTime>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub depth_meters: Option<f64>,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub ph_level: Option<f64>,
    #[serde(default)]
    pub dissolved_oxygen: Option<f64>,
    #[serde(default)]
    pub turbidity: Option<f64>,
    #[serde(default)]
    pub conductivity: Option<f64>,
    #[serde(default)]
    pub heavy_metals: Vec<MetalReading>,
}

impl WaterSample {
    /// A sample with no optional parameters and no readings.
    pub fn new(sample_id: &str, project_id: &str, sample_name: &str, collection_date: NaiveDate) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            project_id: project_id.to_string(),
            sample_name: sample_name.to_string(),
            collection_date,
            collection_time: None,
            latitude: None,
            longitude: None,
            depth_meters: None,
            temperature_celsius: None,
            ph_level: None,
            dissolved_oxygen: None,
            turbidity: None,
            conductivity: None,
            heavy_metals: Vec::new(),
        }
    }

    pub fn with_reading(mut self, reading: MetalReading) -> Self {
        self.heavy_metals.push(reading);
        self
    }
}
