use crate::pollution_index::IndexResult;
use groundwatch_schemas::{
    alert::{Alert, AlertSeverity},
    calculation::{CalculationRecord, ContaminationLevel},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentEvent {
    Calculated {
        sample_id: String,
        hmpi_value: f64,
        level: ContaminationLevel,
    },
    AlertRaised {
        alert_id: String,
        severity: AlertSeverity,
    },
    Skipped {
        sample_id: String,
        reason: String,
    },
}

/// Everything produced by assessing one sample.
#[derive(Debug, Clone)]
pub struct SampleAssessment {
    pub sample_name: String,
    pub project_id: String,
    pub result: IndexResult,
    pub record: CalculationRecord,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub assessments: Vec<SampleAssessment>,
    pub events: Vec<AssessmentEvent>,
}
