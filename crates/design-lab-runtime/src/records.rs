//! Records for test and batch injection, read from CSV or JSON files
//!
//! CSV files use the header row as field names; empty cells are left out
//! of the record so the binding shows up as unresolved. JSON files hold an
//! array of flat objects, or a single object.

use design_lab::{DesignError, Record, RecordProvider};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Unsupported record file '{0}' (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("No records in {0}")]
    Empty(PathBuf),
}

impl From<RecordError> for DesignError {
    fn from(error: RecordError) -> Self {
        match error {
            RecordError::Io(e) => DesignError::Io(e),
            RecordError::Json(e) => DesignError::Json(e),
            RecordError::TaskJoin(e) => DesignError::TaskJoin(e),
            other => DesignError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

/// Load every record in a `.csv` or `.json` file
pub async fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>, RecordError> {
    let path = path.as_ref().to_owned();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);

    let contents = match extension.as_deref() {
        Some("csv") | Some("json") => tokio::fs::read_to_string(&path).await?,
        _ => return Err(RecordError::UnsupportedFormat(path)),
    };

    let records = if extension.as_deref() == Some("csv") {
        tokio::task::spawn_blocking(move || parse_csv(&contents)).await??
    } else {
        parse_json(&contents)?
    };

    log::debug!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

pub fn parse_csv(contents: &str) -> Result<Vec<Record>, RecordError> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.trim().is_empty())
            .map(|(key, cell)| (key.trim(), cell.to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}

pub fn parse_json(contents: &str) -> Result<Vec<Record>, RecordError> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(RecordError::from))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

/// Serves the first record of a file as every tenant's sample
#[derive(Debug, Clone)]
pub struct FileRecordProvider {
    path: PathBuf,
}

impl FileRecordProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordProvider for FileRecordProvider {
    async fn fetch_sample_record(&self, tenant_id: &str) -> design_lab::Result<Record> {
        let record = load_records(&self.path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RecordError::Empty(self.path.clone()))?;
        log::debug!("Sample record for tenant '{}' has {} field(s)", tenant_id, record.len());
        Ok(record)
    }
}
