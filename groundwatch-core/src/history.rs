use crate::error::GroundwatchError;
use csv::{Writer, WriterBuilder};
use groundwatch_schemas::calculation::CalculationRecord;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Append-only CSV store of HMPI calculations.
pub struct CalculationLog {
    path: PathBuf,
    writer: Writer<fs::File>,
}

impl CalculationLog {
    /// Opens `path` for appending, writing the header row only when the file is new or empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GroundwatchError> {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        let needs_header = fs::metadata(&path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| GroundwatchError::FileIO(display, e))?;
        let writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        Ok(Self { path, writer })
    }

    pub fn append(&mut self, record: &CalculationRecord) -> Result<(), GroundwatchError> {
        let display = self.path.display().to_string();
        self.writer
            .serialize(record)
            .map_err(|e| GroundwatchError::CsvError(display.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| GroundwatchError::FileIO(display, e))?;
        Ok(())
    }
}

/// Reads every calculation ever recorded. A missing file is an empty history.
pub fn read_history(path: impl AsRef<Path>) -> Result<Vec<CalculationRecord>, GroundwatchError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let display = path.display().to_string();
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| GroundwatchError::CsvError(display.clone(), e))?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: CalculationRecord =
            result.map_err(|e| GroundwatchError::CsvError(display.clone(), e))?;
        records.push(record);
    }
    Ok(records)
}

/// The most recent calculation of each sample, keyed by sample id.
pub fn latest_by_sample(records: &[CalculationRecord]) -> HashMap<String, CalculationRecord> {
    let mut latest: HashMap<String, CalculationRecord> = HashMap::new();
    for record in records {
        match latest.get(&record.sample_id) {
            Some(existing) if existing.calculated_at >= record.calculated_at => {}
            _ => {
                latest.insert(record.sample_id.clone(), record.clone());
            }
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use groundwatch_schemas::calculation::ContaminationLevel;

    fn record(sample_id: &str, value: f64, hour: u32) -> CalculationRecord {
        CalculationRecord {
            sample_id: sample_id.to_string(),
            hmpi_value: value,
            contamination_level: crate::pollution_index::classify(value),
            calculated_at: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            calculated_by: "analyst".to_string(),
        }
    }

    #[test]
    fn appends_across_reopen_without_duplicate_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calculations.csv");

        {
            let mut log = CalculationLog::open(&path).unwrap();
            log.append(&record("S-1", 42.0, 1)).unwrap();
        }
        {
            let mut log = CalculationLog::open(&path).unwrap();
            log.append(&record("S-1", 320.5, 2)).unwrap();
        }

        let history = read_history(&path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].contamination_level, ContaminationLevel::VeryHigh);
        assert_eq!(history[1].calculated_at, record("S-1", 0.0, 2).calculated_at);
    }

    #[test]
    fn missing_history_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_history(dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn latest_record_wins_regardless_of_file_order() {
        let records = vec![record("S-1", 10.0, 5), record("S-1", 99.0, 3), record("S-2", 7.0, 1)];
        let latest = latest_by_sample(&records);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["S-1"].hmpi_value, 10.0);
        assert_eq!(latest["S-2"].hmpi_value, 7.0);
    }
}
