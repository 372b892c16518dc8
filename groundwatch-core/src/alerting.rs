//! Contamination alerts raised after a sample has been assessed.

use crate::pollution_index::{IndexResult, HIGH_THRESHOLD, VERY_HIGH_THRESHOLD};
use chrono::{DateTime, Utc};
use groundwatch_schemas::{
    alert::{Alert, AlertSeverity, AlertType},
    sample::WaterSample,
};

/// Index values above which an alert is raised, and above which it becomes critical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    pub alert_threshold: f64,
    pub critical_threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            alert_threshold: HIGH_THRESHOLD,
            critical_threshold: VERY_HIGH_THRESHOLD,
        }
    }
}

impl AlertPolicy {
    pub fn severity_for(&self, index: f64) -> Option<AlertSeverity> {
        if index > self.critical_threshold {
            Some(AlertSeverity::Critical)
        } else if index > self.alert_threshold {
            Some(AlertSeverity::High)
        } else {
            None
        }
    }

    /// Returns the alert a result warrants, or `None` when the index is within tolerance.
    pub fn evaluate(
        &self,
        result: &IndexResult,
        sample: &WaterSample,
        created_at: DateTime<Utc>,
    ) -> Option<Alert> {
        let severity = self.severity_for(result.index)?;
        Some(Alert {
            alert_id: format!("ALRT-{}-{}", sample.sample_id, created_at.timestamp_millis()),
            project_id: sample.project_id.clone(),
            sample_id: sample.sample_id.clone(),
            alert_type: AlertType::Contamination,
            severity,
            message: format!(
                "High HMPI value detected: {:.2} in sample {}",
                result.index, sample.sample_name
            ),
            created_at,
            resolved: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwatch_schemas::calculation::ContaminationLevel;
    use std::collections::BTreeMap;

    fn result_with_index(index: f64) -> IndexResult {
        IndexResult {
            index,
            level: crate::pollution_index::classify(index),
            contributions: BTreeMap::new(),
            recommendations: Vec::new(),
        }
    }

    fn sample() -> WaterSample {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        WaterSample::new("S-7", "P-2", "Well 7", date)
    }

    #[test]
    fn severity_follows_thresholds() {
        let policy = AlertPolicy::default();
        assert_eq!(policy.severity_for(150.0), None);
        assert_eq!(policy.severity_for(150.01), Some(AlertSeverity::High));
        assert_eq!(policy.severity_for(300.0), Some(AlertSeverity::High));
        assert_eq!(policy.severity_for(300.01), Some(AlertSeverity::Critical));
    }

    #[test]
    fn moderate_result_raises_nothing() {
        let result = result_with_index(120.0);
        assert_eq!(result.level, ContaminationLevel::Moderate);
        assert!(AlertPolicy::default().evaluate(&result, &sample(), Utc::now()).is_none());
    }

    #[test]
    fn alert_carries_sample_context() {
        let alert = AlertPolicy::default()
            .evaluate(&result_with_index(472.7272), &sample(), Utc::now())
            .expect("critical alert");
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.project_id, "P-2");
        assert_eq!(alert.sample_id, "S-7");
        assert_eq!(alert.message, "High HMPI value detected: 472.73 in sample Well 7");
        assert!(!alert.resolved);
    }
}
