//! Validation of sample data before it is assessed or stored.

use crate::error::GroundwatchError;
use groundwatch_schemas::{project::Project, sample::WaterSample};
use std::collections::HashMap;
use tracing::debug;

fn invalid(sample: &WaterSample, reason: impl Into<String>) -> GroundwatchError {
    GroundwatchError::InvalidSample {
        sample: sample.sample_id.clone(),
        reason: reason.into(),
    }
}

/// Checks a sample against its project and returns a copy holding only entered readings.
///
/// Readings with a zero concentration count as "not measured" and are dropped.
/// Negative or non-finite concentrations are rejected.
pub fn prepare_sample(
    sample: &WaterSample,
    projects: &HashMap<String, Project>,
) -> Result<WaterSample, GroundwatchError> {
    if sample.sample_name.trim().is_empty() {
        return Err(invalid(sample, "sample name is empty"));
    }
    if !projects.contains_key(&sample.project_id) {
        return Err(GroundwatchError::ProjectNotFound(sample.project_id.clone()));
    }
    if let Some(lat) = sample.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid(sample, format!("latitude {} is out of range", lat)));
        }
    }
    if let Some(lon) = sample.longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(invalid(sample, format!("longitude {} is out of range", lon)));
        }
    }

    let mut prepared = sample.clone();
    prepared.heavy_metals.clear();
    for reading in &sample.heavy_metals {
        if reading.metal_type.trim().is_empty() {
            return Err(invalid(sample, "reading without a metal type"));
        }
        if !reading.concentration_mg_l.is_finite() || reading.concentration_mg_l < 0.0 {
            return Err(invalid(
                sample,
                format!(
                    "concentration {} mg/L for {} is not a valid measurement",
                    reading.concentration_mg_l, reading.metal_type
                ),
            ));
        }
        if reading.concentration_mg_l > 0.0 {
            prepared.heavy_metals.push(reading.clone());
        } else {
            debug!(sample = %sample.sample_id, metal = %reading.metal_type, "dropping unmeasured reading");
        }
    }

    Ok(prepared)
}

/// A sample must carry at least one reading before its index is computed and stored.
pub fn ensure_assessable(sample: &WaterSample) -> Result<(), GroundwatchError> {
    if sample.heavy_metals.is_empty() {
        return Err(GroundwatchError::NoReadings(sample.sample_id.clone()));
    }
    Ok(())
}
