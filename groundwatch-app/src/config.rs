use anyhow::{bail, Context, Result};
use groundwatch_core::alerting::AlertPolicy;
use groundwatch_schemas::{
    file_formats::{ProjectFile, SampleFile, StandardsFile},
    project::Project,
    sample::WaterSample,
    standard::{StandardsTable, DEFAULT_JURISDICTION},
};
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "groundwatch.yaml";

/// Settings read from `groundwatch.yaml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub jurisdiction: String,
    pub alert_threshold: f64,
    pub critical_threshold: f64,
    pub analyst: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = AlertPolicy::default();
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./data/reports"),
            jurisdiction: DEFAULT_JURISDICTION.to_string(),
            alert_threshold: policy.alert_threshold,
            critical_threshold: policy.critical_threshold,
            analyst: "unknown".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration file.
    ///
    /// An explicitly given path must exist. Without one, `groundwatch.yaml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy {
            alert_threshold: self.alert_threshold,
            critical_threshold: self.critical_threshold,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("calculations.csv")
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.data_dir.join("alerts.json")
    }
}

/// A container for the projects, samples and standards found in the data directory.
pub struct MonitoringData {
    pub standards: HashMap<String, StandardsTable>,
    pub projects: Vec<Project>,
    pub samples: Vec<WaterSample>,
}

impl MonitoringData {
    /// Loads all data from the specified base directory.
    pub fn load(base_path: &Path) -> Result<Self> {
        info!(path = %base_path.display(), "loading monitoring data");

        let standards = load_yaml_files(base_path.join("standards"), |file: StandardsFile| {
            file.standards
        })?;
        let projects = load_yaml_files(base_path.join("projects"), |file: ProjectFile| {
            file.projects
        })?;
        let samples = load_yaml_files(base_path.join("samples"), |file: SampleFile| file.samples)?;

        ensure_unique(&projects, |p: &Project| p.project_id.as_str(), "project")?;
        ensure_unique(&samples, |s: &WaterSample| s.sample_id.as_str(), "sample")?;

        let standards = standards
            .into_iter()
            .map(|table| (table.jurisdiction.clone(), table))
            .collect();

        info!(
            projects = projects.len(),
            samples = samples.len(),
            "monitoring data loaded"
        );
        Ok(Self {
            standards,
            projects,
            samples,
        })
    }

    /// The standards table for `jurisdiction`, falling back to the built-in WHO/EPA limits.
    pub fn standards_for(&self, jurisdiction: &str) -> Result<StandardsTable> {
        if let Some(table) = self.standards.get(jurisdiction) {
            return Ok(table.clone());
        }
        if jurisdiction == DEFAULT_JURISDICTION {
            return Ok(StandardsTable::who_epa());
        }
        bail!(
            "No standards defined for jurisdiction '{}' (known: {:?})",
            jurisdiction,
            self.standards.keys().collect::<Vec<_>>()
        )
    }

    pub fn sample(&self, sample_id: &str) -> Option<&WaterSample> {
        self.samples.iter().find(|s| s.sample_id == sample_id)
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }
}

fn ensure_unique<T, K>(items: &[T], key: K, kind: &str) -> Result<()>
where
    K: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(key(item)) {
            bail!("Duplicate {} id '{}' in data directory", kind, key(item));
        }
    }
    Ok(())
}

/// Generic helper to load all YAML files in a directory, in file name order.
///
/// A missing directory yields no items.
fn load_yaml_files<P, F, E, T>(dir_path: P, extract_vec: E) -> Result<Vec<T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., ProjectFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
{
    let dir_path = dir_path.as_ref();
    if !dir_path.exists() {
        warn!(path = %dir_path.display(), "data directory missing, treating as empty");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read directory: {:?}", dir_path))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        items.extend(extract_vec(file_wrapper));
    }
    Ok(items)
}
