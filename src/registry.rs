//! Versioned chart artifacts and their status lifecycle.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::record::CategorySelector;
use crate::services::{ArtifactStore, MetadataStore};

/// Lifecycle of a chart artifact: `new` moves exactly once to a terminal status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStatus {
    New,
    Success,
    Error,
}

impl ChartStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ChartStatus::New)
    }
}

impl fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartStatus::New => "new",
            ChartStatus::Success => "success",
            ChartStatus::Error => "error",
        })
    }
}

/// Metadata of one stored rendering of a category report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub chart_type: CategorySelector,
    pub key: String,
    pub version: u32,
    pub status: ChartStatus,
    pub url: Option<String>,
}

impl ChartArtifact {
    /// A freshly claimed artifact.
    pub fn new(chart_type: CategorySelector, key: impl Into<String>, version: u32) -> Self {
        Self {
            chart_type,
            key: key.into(),
            version,
            status: ChartStatus::New,
            url: None,
        }
    }

    /// Applies a terminal transition, enforcing the lifecycle rules.
    ///
    /// `Error` always clears the url; `Success` requires one.
    pub fn finalized(&self, status: ChartStatus, url: Option<String>) -> Result<Self> {
        if self.status.is_terminal() {
            return Err(ReportError::AlreadyFinalized {
                key: self.key.clone(),
                status: self.status,
            });
        }
        let url = match status {
            ChartStatus::New => {
                return Err(ReportError::InvalidArgument(
                    "an artifact cannot be finalized back to 'new'".into(),
                ))
            }
            ChartStatus::Success => Some(url.ok_or_else(|| {
                ReportError::InvalidArgument(format!(
                    "chart '{}' cannot succeed without a url",
                    self.key
                ))
            })?),
            ChartStatus::Error => None,
        };
        Ok(Self {
            status,
            url,
            ..self.clone()
        })
    }
}

/// Version sequencing and status bookkeeping for chart artifacts.
#[derive(Clone)]
pub struct ChartRegistry {
    metadata: Arc<dyn MetadataStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ChartRegistry {
    pub fn new(metadata: Arc<dyn MetadataStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            metadata,
            artifacts,
        }
    }

    /// The version the next [`record_new`](Self::record_new) would claim right now.
    ///
    /// Informational only; the claim itself happens atomically inside `record_new`.
    pub async fn next_version(&self, chart_type: CategorySelector) -> Result<u32> {
        let max = self.metadata.max_version(chart_type).await?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Registers a new artifact in status `new` under the next free version.
    pub async fn record_new(&self, chart_type: CategorySelector, key: &str) -> Result<ChartArtifact> {
        if key.trim().is_empty() {
            return Err(ReportError::InvalidArgument("chart key must not be empty".into()));
        }
        let artifact = self.metadata.insert_next(chart_type, key).await?;
        debug!(
            "claimed version {} of '{}' for chart {}",
            artifact.version, chart_type, artifact.key
        );
        Ok(artifact)
    }

    /// Moves the artifact to a terminal status. A second call for the same key
    /// is rejected with [`ReportError::AlreadyFinalized`].
    pub async fn finalize(
        &self,
        key: &str,
        status: ChartStatus,
        url: Option<String>,
    ) -> Result<ChartArtifact> {
        match self.metadata.finalize(key, status, url).await {
            Ok(artifact) => {
                info!(
                    "chart {} ({} v{}) finalized as {}",
                    artifact.key, artifact.chart_type, artifact.version, artifact.status
                );
                Ok(artifact)
            }
            Err(err @ ReportError::AlreadyFinalized { .. }) => {
                warn!("ignoring repeated finalize of chart {key}: {err}");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Stores rendered bytes and returns their public url.
    pub async fn store_document(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        self.artifacts.put(key, bytes).await?;
        Ok(self.artifacts.public_url(key))
    }

    /// Reads the stored bytes of an artifact.
    pub async fn document(&self, key: &str) -> Result<Vec<u8>> {
        self.artifacts.get(key).await
    }

    /// Deletes stored bytes that no finalized artifact points at.
    pub async fn discard_document(&self, key: &str) -> Result<()> {
        self.artifacts.delete(key).await?;
        debug!("discarded document of chart {key}");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<ChartArtifact> {
        self.metadata
            .get(key)
            .await?
            .ok_or_else(|| ReportError::NotFound(key.to_owned()))
    }

    /// Artifacts of one chart type ordered by version.
    pub async fn list(&self, chart_type: CategorySelector) -> Result<Vec<ChartArtifact>> {
        self.metadata.list(Some(chart_type)).await
    }

    /// Every artifact, grouped by chart type and ordered by version.
    pub async fn list_all(&self) -> Result<Vec<ChartArtifact>> {
        self.metadata.list(None).await
    }

    /// Removes the metadata record and then the stored bytes.
    ///
    /// If the bytes cannot be removed after the metadata is gone the failure
    /// is reported as [`ReportError::InconsistentDelete`].
    pub async fn delete(&self, key: &str) -> Result<ChartArtifact> {
        let artifact = self
            .metadata
            .remove(key)
            .await?
            .ok_or_else(|| ReportError::NotFound(key.to_owned()))?;

        if let Err(err) = self.artifacts.delete(key).await {
            warn!("chart {key} metadata removed but document delete failed: {err}");
            return Err(ReportError::InconsistentDelete {
                key: key.to_owned(),
                reason: err.to_string(),
            });
        }
        info!("deleted chart {key}");
        Ok(artifact)
    }
}
