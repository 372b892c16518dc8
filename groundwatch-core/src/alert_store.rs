use crate::error::GroundwatchError;
use groundwatch_schemas::alert::Alert;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Alerts persisted as a pretty-printed JSON array.
#[derive(Debug)]
pub struct AlertStore {
    path: PathBuf,
    alerts: Vec<Alert>,
}

impl AlertStore {
    /// Loads the store at `path`; a missing file starts an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GroundwatchError> {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        let alerts = if path.exists() {
            let content =
                fs::read_to_string(&path).map_err(|e| GroundwatchError::FileIO(display.clone(), e))?;
            serde_json::from_str(&content).map_err(|e| GroundwatchError::JsonParsing(display, e))?
        } else {
            Vec::new()
        };
        Ok(Self { path, alerts })
    }

    /// Writes to a sibling temp file and renames it over the store.
    pub fn save(&self) -> Result<(), GroundwatchError> {
        let display = self.path.display().to_string();
        let json = serde_json::to_string_pretty(&self.alerts)
            .map_err(|e| GroundwatchError::JsonParsing(display.clone(), e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| GroundwatchError::FileIO(display.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| GroundwatchError::FileIO(display, e))?;
        Ok(())
    }

    /// Adds an alert, suffixing its id with `-2`, `-3`, ... when the id is already taken.
    pub fn push(&mut self, mut alert: Alert) -> &Alert {
        let base = alert.alert_id.clone();
        let mut n = 2;
        while self.alerts.iter().any(|a| a.alert_id == alert.alert_id) {
            alert.alert_id = format!("{}-{}", base, n);
            n += 1;
        }
        info!(alert = %alert.alert_id, severity = %alert.severity, "raised alert");
        self.alerts.push(alert);
        &self.alerts[self.alerts.len() - 1]
    }

    /// Adds an alert and saves the store. On a failed save the alert is dropped again.
    pub fn record(&mut self, alert: Alert) -> Result<Alert, GroundwatchError> {
        let stored = self.push(alert).clone();
        if let Err(e) = self.save() {
            self.alerts.pop();
            return Err(e);
        }
        Ok(stored)
    }

    /// Marks an alert resolved. Resolving twice is harmless.
    pub fn resolve(&mut self, alert_id: &str) -> Result<&Alert, GroundwatchError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| GroundwatchError::AlertNotFound(alert_id.to_string()))?;
        alert.resolved = true;
        Ok(&*alert)
    }

    /// Alerts newest first, optionally only those still open.
    pub fn list(&self, unresolved_only: bool) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self
            .alerts
            .iter()
            .filter(|a| !unresolved_only || !a.resolved)
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }

    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }
}
