//! Record sources that do not need a database.

use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;

use crate::error::{ReportError, Result};
use crate::record::SubjectRecord;
use crate::services::RecordSource;

/// Serves a fixed set of records.
#[derive(Clone, Debug, Default)]
pub struct StaticRecords {
    records: Vec<SubjectRecord>,
}

impl StaticRecords {
    pub fn new(records: impl Into<Vec<SubjectRecord>>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

#[async_trait]
impl RecordSource for StaticRecords {
    async fn fetch_all(&self) -> Result<Vec<SubjectRecord>> {
        Ok(self.records.clone())
    }
}

/// Reads records from a JSON array on disk on every fetch.
#[derive(Clone, Debug)]
pub struct JsonFileRecords {
    path: PathBuf,
}

impl JsonFileRecords {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileRecords {
    async fn fetch_all(&self) -> Result<Vec<SubjectRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            ReportError::SourceUnavailable(format!("{}: {err}", self.path.display()))
        })?;
        let records: Vec<SubjectRecord> = serde_json::from_str(&contents).map_err(|err| {
            ReportError::SourceUnavailable(format!(
                "{} is not a valid record list: {err}",
                self.path.display()
            ))
        })?;
        debug!("loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
