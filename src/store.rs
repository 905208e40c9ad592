//! In-process and filesystem implementations of the storage contracts.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::StorageConfig;
use crate::error::{ReportError, Result};
use crate::record::CategorySelector;
use crate::registry::{ChartArtifact, ChartStatus};
use crate::services::{ArtifactStore, MetadataStore};

/// Object name of the document stored under `key`.
pub fn object_name(key: &str) -> String {
    format!("{key}.pdf")
}

/// Metadata store keeping every artifact in memory.
///
/// A single async mutex serializes claims and transitions, which gives the
/// read-max-then-insert step its atomicity.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    artifacts: Mutex<HashMap<String, ChartArtifact>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn max_version_of<'a>(
    artifacts: impl Iterator<Item = &'a ChartArtifact>,
    chart_type: CategorySelector,
) -> Option<u32> {
    artifacts
        .filter(|artifact| artifact.chart_type == chart_type)
        .map(|artifact| artifact.version)
        .max()
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn max_version(&self, chart_type: CategorySelector) -> Result<Option<u32>> {
        let artifacts = self.artifacts.lock().await;
        Ok(max_version_of(artifacts.values(), chart_type))
    }

    async fn insert_next(&self, chart_type: CategorySelector, key: &str) -> Result<ChartArtifact> {
        let mut artifacts = self.artifacts.lock().await;
        if artifacts.contains_key(key) {
            return Err(ReportError::InvalidArgument(format!(
                "chart key '{key}' already exists"
            )));
        }
        let version = max_version_of(artifacts.values(), chart_type).unwrap_or(0) + 1;
        let artifact = ChartArtifact::new(chart_type, key, version);
        artifacts.insert(key.to_owned(), artifact.clone());
        Ok(artifact)
    }

    async fn finalize(
        &self,
        key: &str,
        status: ChartStatus,
        url: Option<String>,
    ) -> Result<ChartArtifact> {
        let mut artifacts = self.artifacts.lock().await;
        let current = artifacts
            .get_mut(key)
            .ok_or_else(|| ReportError::NotFound(key.to_owned()))?;
        let updated = current.finalized(status, url)?;
        *current = updated.clone();
        Ok(updated)
    }

    async fn get(&self, key: &str) -> Result<Option<ChartArtifact>> {
        Ok(self.artifacts.lock().await.get(key).cloned())
    }

    async fn list(&self, chart_type: Option<CategorySelector>) -> Result<Vec<ChartArtifact>> {
        let artifacts = self.artifacts.lock().await;
        let mut listed: Vec<_> = artifacts
            .values()
            .filter(|artifact| chart_type.map_or(true, |wanted| artifact.chart_type == wanted))
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            a.chart_type
                .cmp(&b.chart_type)
                .then(a.version.cmp(&b.version))
        });
        Ok(listed)
    }

    async fn remove(&self, key: &str) -> Result<Option<ChartArtifact>> {
        Ok(self.artifacts.lock().await.remove(key))
    }
}

/// Artifact store holding documents in memory.
#[derive(Debug)]
pub struct InMemoryArtifactStore {
    base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Store publishing under `[storage] public_base_url`.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.public_base_url.clone())
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects.lock().await.insert(object_name(key), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&object_name(key))
            .cloned()
            .ok_or_else(|| ReportError::NotFound(key.to_owned()))
    }

    /// Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().await.remove(&object_name(key));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), object_name(key))
    }
}

/// Artifact store writing documents into a directory.
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
    base_url: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Store under `root` publishing under `[storage] public_base_url`.
    pub fn from_config(root: impl Into<PathBuf>, config: &StorageConfig) -> Self {
        Self::new(root, config.public_base_url.clone())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(|c: char| c == '/' || c == '\\') || key.starts_with('.') {
            return Err(ReportError::InvalidArgument(format!(
                "'{key}' is not a valid document key"
            )));
        }
        Ok(self.root.join(object_name(key)))
    }
}

fn store_failure(action: &str, key: &str, err: io::Error) -> ReportError {
    ReportError::StoreFailure(format!("failed to {action} document '{key}': {err}"))
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| store_failure("prepare directory for", key, err))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| store_failure("write", key, err))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ReportError::NotFound(key.to_owned()))
            }
            Err(err) => Err(store_failure("read", key, err)),
        }
    }

    /// Deleting a missing file succeeds.
    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(store_failure("delete", key, err)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), object_name(key))
    }
}
