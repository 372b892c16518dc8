use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity band of an HMPI value, ordered from least to most polluted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContaminationLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ContaminationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ContaminationLevel::Low => "low",
            ContaminationLevel::Moderate => "moderate",
            ContaminationLevel::High => "high",
            ContaminationLevel::VeryHigh => "very_high",
        }
    }

    /// Human readable risk classification shown next to a result.
    pub fn risk_label(self) -> &'static str {
        match self {
            ContaminationLevel::Low => "Acceptable",
            ContaminationLevel::Moderate => "Moderate Risk",
            ContaminationLevel::High => "High Risk",
            ContaminationLevel::VeryHigh => "Critical Risk",
        }
    }
}

impl fmt::Display for ContaminationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted HMPI computation. Records are never updated; a newer record supersedes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub sample_id: String,
    pub hmpi_value: f64,
    pub contamination_level: ContaminationLevel,
    pub calculated_at: DateTime<Utc>,
    pub calculated_by: String,
}
