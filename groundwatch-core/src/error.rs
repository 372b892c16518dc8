use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroundwatchError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Sample '{0}' not found")]
    SampleNotFound(String),

    #[error("Alert '{0}' not found")]
    AlertNotFound(String),

    #[error("Sample '{0}' has no heavy metal readings to assess")]
    NoReadings(String),

    #[error("Invalid sample '{sample}': {reason}")]
    InvalidSample { sample: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse JSON from '{0}': {1}")]
    JsonParsing(String, #[source] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
