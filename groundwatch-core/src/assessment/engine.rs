use super::state::{AssessmentEvent, SampleAssessment, SessionState};
use crate::{
    alert_store::AlertStore,
    alerting::AlertPolicy,
    error::GroundwatchError,
    history::CalculationLog,
    intake,
    pollution_index::{self, IndexResult},
};
use chrono::{DateTime, Utc};
use groundwatch_schemas::{
    calculation::CalculationRecord, project::Project, sample::WaterSample,
    standard::StandardsTable,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Assesses samples: validates them, computes the HMPI, records the result and raises alerts.
pub struct AssessmentEngine {
    pub(super) standards: StandardsTable,
    pub(super) policy: AlertPolicy,
    pub(super) projects: HashMap<String, Project>,
    pub(super) analyst: String,
    pub(super) history: Option<CalculationLog>,
    pub(super) alerts: Option<AlertStore>,
    pub(super) state: SessionState,
}

impl AssessmentEngine {
    /// Assesses every sample, skipping the ones that fail validation or carry no readings.
    ///
    /// Storage failures abort the run. Samples assessed before the failure keep
    /// their stored history rows and alerts.
    pub fn run(&mut self, samples: &[WaterSample]) -> Result<(), GroundwatchError> {
        info!(
            samples = samples.len(),
            jurisdiction = %self.standards.jurisdiction,
            "starting assessment run"
        );

        for sample in samples {
            match self.assess(sample, Utc::now()).map(|_| ()) {
                Ok(()) => {}
                Err(
                    e @ (GroundwatchError::NoReadings(_)
                    | GroundwatchError::InvalidSample { .. }
                    | GroundwatchError::ProjectNotFound(_)),
                ) => {
                    warn!(sample = %sample.sample_id, error = %e, "skipping sample");
                    self.state.events.push(AssessmentEvent::Skipped {
                        sample_id: sample.sample_id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(assessed = self.state.assessments.len(), "assessment run complete");
        Ok(())
    }

    /// Assesses a single sample as of `now`.
    pub fn assess(
        &mut self,
        sample: &WaterSample,
        now: DateTime<Utc>,
    ) -> Result<&SampleAssessment, GroundwatchError> {
        let prepared = intake::prepare_sample(sample, &self.projects)?;
        intake::ensure_assessable(&prepared)?;

        let result = self.calculate(&prepared);
        let record = CalculationRecord {
            sample_id: prepared.sample_id.clone(),
            hmpi_value: result.index,
            contamination_level: result.level,
            calculated_at: now,
            calculated_by: self.analyst.clone(),
        };

        // The alert is stored before the history row: a sample with a history row
        // counts as assessed and is not revisited.
        let alert = match (self.policy.evaluate(&result, &prepared, now), &mut self.alerts) {
            (Some(raised), Some(store)) => Some(store.record(raised)?),
            (raised, _) => raised,
        };
        if let Some(log) = &mut self.history {
            log.append(&record)?;
        }

        self.state.events.push(AssessmentEvent::Calculated {
            sample_id: record.sample_id.clone(),
            hmpi_value: record.hmpi_value,
            level: record.contamination_level,
        });
        if let Some(alert) = &alert {
            self.state.events.push(AssessmentEvent::AlertRaised {
                alert_id: alert.alert_id.clone(),
                severity: alert.severity,
            });
        }

        let index = self.state.assessments.len();
        self.state.assessments.push(SampleAssessment {
            sample_name: prepared.sample_name.clone(),
            project_id: prepared.project_id.clone(),
            result,
            record,
            alert,
        });
        Ok(&self.state.assessments[index])
    }

    /// Computes the index without validating, recording or alerting.
    pub fn calculate(&self, sample: &WaterSample) -> IndexResult {
        let readings = pollution_index::readings_from_sample(sample);
        pollution_index::calculate_hmpi(&readings, &self.standards)
    }

    pub fn assessments(&self) -> &[SampleAssessment] {
        &self.state.assessments
    }

    pub fn events(&self) -> &[AssessmentEvent] {
        &self.state.events
    }

    pub fn standards(&self) -> &StandardsTable {
        &self.standards
    }
}
