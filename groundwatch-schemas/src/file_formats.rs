use crate::{project::Project, sample::WaterSample, standard::StandardsTable};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StandardsFile {
    pub schema_version: String,
    pub standards: Vec<StandardsTable>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFile {
    pub schema_version: String,
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct SampleFile {
    pub schema_version: String,
    pub samples: Vec<WaterSample>,
}
