use crate::{
    alert_store::AlertStore,
    alerting::AlertPolicy,
    assessment::{engine::AssessmentEngine, state::SessionState},
    error::GroundwatchError,
    history::CalculationLog,
};
use groundwatch_schemas::{project::Project, standard::StandardsTable};
use std::collections::HashMap;
use std::path::PathBuf;

/// A fluent builder for constructing an `AssessmentEngine`.
///
/// Standards default to the WHO/EPA table and alerting to the 150/300 thresholds.
/// Persistence is opt-in: without a history file or alert store, results only live
/// in the engine's session state.
#[derive(Default)]
pub struct AssessmentBuilder {
    standards: Option<StandardsTable>,
    policy: AlertPolicy,
    projects: Vec<Project>,
    analyst: Option<String>,
    history_path: Option<PathBuf>,
    alert_store_path: Option<PathBuf>,
}

impl AssessmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standards(mut self, standards: StandardsTable) -> Self {
        self.standards = Some(standards);
        self
    }

    pub fn with_alert_policy(mut self, policy: AlertPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the projects samples may belong to.
    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    /// Sets the name recorded as `calculated_by` on each calculation.
    pub fn with_analyst(mut self, analyst: &str) -> Self {
        self.analyst = Some(analyst.to_string());
        self
    }

    /// Appends every calculation to the CSV history at `path`.
    pub fn with_history_logging_to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Records raised alerts in the JSON alert store at `path`.
    pub fn with_alert_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.alert_store_path = Some(path.into());
        self
    }

    /// Consumes the builder and returns a configured `AssessmentEngine`.
    ///
    /// # Errors
    ///
    /// Returns a `GroundwatchError` if the alert thresholds are inconsistent or the
    /// history or alert files cannot be opened. An engine without projects skips
    /// every sample as belonging to an unknown project.
    pub fn build(self) -> Result<AssessmentEngine, GroundwatchError> {
        if !(self.policy.alert_threshold <= self.policy.critical_threshold) {
            return Err(GroundwatchError::ConfigError(format!(
                "alert threshold {} exceeds critical threshold {}",
                self.policy.alert_threshold, self.policy.critical_threshold
            )));
        }

        let history = match self.history_path {
            Some(path) => Some(CalculationLog::open(path)?),
            None => None,
        };
        let alerts = match self.alert_store_path {
            Some(path) => Some(AlertStore::load(path)?),
            None => None,
        };
        let projects: HashMap<String, Project> = self
            .projects
            .into_iter()
            .map(|p| (p.project_id.clone(), p))
            .collect();

        Ok(AssessmentEngine {
            standards: self.standards.unwrap_or_default(),
            policy: self.policy,
            projects,
            analyst: self.analyst.unwrap_or_else(|| "unknown".to_string()),
            history,
            alerts,
            state: SessionState::default(),
        })
    }
}
