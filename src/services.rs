//! Collaborator contracts the pipeline depends on.
//!
//! Every network- or storage-bound dependency is injected through one of these
//! traits so that deterministic fakes can stand in during tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::aggregate::Distribution;
use crate::error::Result;
use crate::fonts::FontTable;
use crate::model::ReportLayout;
use crate::record::{CategorySelector, SubjectRecord};
use crate::registry::{ChartArtifact, ChartStatus};

/// Category name to an ordered list of strings, used for batched translation.
pub type TextBatch = BTreeMap<String, Vec<String>>;

/// Supplies the subject records reports are built from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fails with `SourceUnavailable`.
    async fn fetch_all(&self) -> Result<Vec<SubjectRecord>>;
}

/// Machine translation of UI strings and labels.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Fails with `TranslationUnavailable`.
    async fn translate(&self, text: &str, language: &str) -> Result<String>;

    /// Translates every string of every key in one call, keeping order per key.
    ///
    /// The returned map is expected to have the same keys and list lengths;
    /// callers decide what to do when it does not.
    async fn translate_batch(&self, batch: &TextBatch, language: &str) -> Result<TextBatch>;
}

/// Produces a one-sentence narrative (in the default language) for a distribution.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Fails with `AnalysisUnavailable`.
    async fn analyze(&self, distribution: &Distribution) -> Result<String>;
}

/// Turns a layout tree into document bytes.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Fails with `RenderFailure`.
    async fn render(&self, layout: &ReportLayout, fonts: &FontTable) -> Result<Vec<u8>>;
}

/// Object storage for rendered documents.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Public location of the object stored under `key`.
    fn public_url(&self, key: &str) -> String;
}

/// Metadata records backing the chart registry.
///
/// Implementations must make [`MetadataStore::insert_next`] and
/// [`MetadataStore::finalize`] atomic with respect to concurrent callers.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Highest version recorded for `chart_type`, if any.
    async fn max_version(&self, chart_type: CategorySelector) -> Result<Option<u32>>;

    /// Reads the current max version and inserts a `new` artifact with
    /// `max + 1` as one step. Fails with `VersionConflict` if the backend
    /// detects a concurrent claim of the same version.
    async fn insert_next(&self, chart_type: CategorySelector, key: &str) -> Result<ChartArtifact>;

    /// Moves the artifact from `new` to `status`. Fails with
    /// `AlreadyFinalized` if it is already terminal and `NotFound` if missing.
    async fn finalize(
        &self,
        key: &str,
        status: ChartStatus,
        url: Option<String>,
    ) -> Result<ChartArtifact>;

    async fn get(&self, key: &str) -> Result<Option<ChartArtifact>>;

    /// Artifacts of `chart_type` (or all when `None`), ordered by version.
    async fn list(&self, chart_type: Option<CategorySelector>) -> Result<Vec<ChartArtifact>>;

    /// Removes and returns the artifact, if present.
    async fn remove(&self, key: &str) -> Result<Option<ChartArtifact>>;
}
