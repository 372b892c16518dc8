//! JSON report files written to the output directory.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub fn water_quality_file_name(date: NaiveDate) -> String {
    format!("water-quality-report-{}.json", date.format("%Y-%m-%d"))
}

pub fn compliance_file_name(region: Option<&str>, date: NaiveDate) -> String {
    let region = region.map_or_else(|| "all".to_string(), slug);
    format!("compliance-report-{}-{}.json", region, date.format("%Y-%m-%d"))
}

pub fn analytics_file_name(date: NaiveDate) -> String {
    format!("analytics-report-{}.json", date.format("%Y-%m-%d"))
}

/// Lowercases and joins words with `-`, dropping anything that cannot live in a file name.
fn slug(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.is_empty() {
        "all".to_string()
    } else {
        words.join("-")
    }
}

/// Pretty-prints `report` to `output_dir/file_name`, creating the directory when needed.
pub fn write_json_report<T: Serialize>(
    output_dir: &Path,
    file_name: &str,
    report: &T,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let path = output_dir.join(file_name);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(&path, json).with_context(|| format!("Failed to write report {:?}", path))?;
    info!(path = %path.display(), "report written");
    Ok(path)
}
