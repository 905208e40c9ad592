//! The report pipeline's public entry points.

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::aggregate::{aggregate, Distribution};
use crate::archive::{ArchiveOrchestrator, ArchiveRequest};
use crate::color::{ColorStrategy, RandomColors};
use crate::config::ReportConfig;
use crate::document::{header_block, page_number_footer, DocumentServices, ReportDocument};
use crate::error::{ReportError, Result};
use crate::fonts::FontTable;
use crate::record::CategorySelector;
use crate::registry::{ChartArtifact, ChartRegistry, ChartStatus};
use crate::services::{Analyzer, RecordSource, Renderer, Translator};

/// What a single report returns besides its registry entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Store the document and return only its metadata.
    #[default]
    StoreOnly,
    /// Store the document and also hand the bytes back to the caller.
    Stream,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleReportOptions {
    /// Target language; `None` uses the configured default.
    pub language: Option<String>,
    pub delivery: Delivery,
}

impl SingleReportOptions {
    pub fn in_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    pub fn streamed(mut self) -> Self {
        self.delivery = Delivery::Stream;
        self
    }
}

/// Outcome of a successful single report.
#[derive(Clone, Debug)]
pub struct SingleReport {
    pub artifact: ChartArtifact,
    /// Present with [`Delivery::Stream`].
    pub bytes: Option<Vec<u8>>,
}

/// Injected collaborators of a [`ReportService`].
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn RecordSource>,
    pub translator: Arc<dyn Translator>,
    pub analyzer: Arc<dyn Analyzer>,
    pub renderer: Arc<dyn Renderer>,
    pub registry: ChartRegistry,
}

/// Aggregation, single reports and archives over one record source.
#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn RecordSource>,
    renderer: Arc<dyn Renderer>,
    registry: ChartRegistry,
    colors: Arc<dyn ColorStrategy>,
    services: DocumentServices,
    fonts: FontTable,
}

impl ReportService {
    pub fn new(collaborators: Collaborators, config: &ReportConfig) -> Self {
        let Collaborators {
            source,
            translator,
            analyzer,
            renderer,
            registry,
        } = collaborators;
        Self {
            source,
            renderer,
            registry,
            colors: Arc::new(RandomColors),
            services: DocumentServices {
                translator,
                analyzer,
                default_language: config.default_language.clone(),
                layout: config.layout,
            },
            fonts: config.font_table(),
        }
    }

    /// Replaces the colour strategy (random by default).
    pub fn with_colors(mut self, colors: Arc<dyn ColorStrategy>) -> Self {
        self.colors = colors;
        self
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    pub fn default_language(&self) -> &str {
        &self.services.default_language
    }

    /// A fresh unique chart key.
    pub fn new_chart_key() -> String {
        Uuid::new_v4().to_string()
    }

    /// Distribution of `category` over every record. Empty when there are no records.
    pub async fn aggregate(&self, category: CategorySelector) -> Result<Distribution> {
        let records = self.source.fetch_all().await?;
        Ok(aggregate(&records, category, self.colors.as_ref()))
    }

    /// Registers, renders, stores and finalizes one category report.
    ///
    /// Once the artifact is registered any failure finalizes it as `error`
    /// before the failure is returned.
    pub async fn build_single_report(
        &self,
        category: CategorySelector,
        key: &str,
        options: SingleReportOptions,
    ) -> Result<SingleReport> {
        let language = options
            .language
            .unwrap_or_else(|| self.services.default_language.clone());
        if language.trim().is_empty() {
            return Err(ReportError::InvalidArgument(
                "report language must not be empty".into(),
            ));
        }

        let distribution = self.aggregate(category).await?;
        if distribution.is_empty() {
            return Err(ReportError::EmptyInput);
        }

        let artifact = self.registry.record_new(category, key).await?;
        info!(
            "building {} report {} (v{}) in {}",
            category, artifact.key, artifact.version, language
        );

        match self.publish(category, key, &language, &distribution).await {
            Ok((artifact, bytes)) => {
                let bytes = match options.delivery {
                    Delivery::Stream => Some(bytes),
                    Delivery::StoreOnly => None,
                };
                Ok(SingleReport { artifact, bytes })
            }
            Err(err) => {
                warn!("report {key} for {category} failed: {err}");
                if let Err(finalize_err) =
                    self.registry.finalize(key, ChartStatus::Error, None).await
                {
                    warn!("could not mark report {key} as failed: {finalize_err}");
                }
                Err(err)
            }
        }
    }

    /// Renders, stores and finalizes as `success`. Bytes stored for an
    /// artifact that could not be finalized are discarded again.
    async fn publish(
        &self,
        category: CategorySelector,
        key: &str,
        language: &str,
        distribution: &Distribution,
    ) -> Result<(ChartArtifact, Vec<u8>)> {
        let (url, bytes) = self
            .render_and_store(category, key, language, distribution)
            .await?;
        match self
            .registry
            .finalize(key, ChartStatus::Success, Some(url))
            .await
        {
            Ok(artifact) => Ok((artifact, bytes)),
            Err(err) => {
                if let Err(discard_err) = self.registry.discard_document(key).await {
                    warn!("could not discard stored document of report {key}: {discard_err}");
                }
                Err(err)
            }
        }
    }

    async fn render_and_store(
        &self,
        category: CategorySelector,
        key: &str,
        language: &str,
        distribution: &Distribution,
    ) -> Result<(String, Vec<u8>)> {
        let mut document = ReportDocument::new(&self.services, language);
        let title = document.localize(category.display_name()).await?;
        document.set_header(header_block(title));
        document.set_footer(page_number_footer());
        document.add_chart_block(distribution).await?;
        document.add_bar_block(distribution).await?;
        document.add_narrative_block(distribution).await?;

        let bytes = document.render(self.renderer.as_ref(), &self.fonts).await?;
        let url = self.registry.store_document(key, bytes.clone()).await?;
        Ok((url, bytes))
    }

    /// Builds a zip of per-category reports from the current records.
    pub async fn build_archive(&self, request: &ArchiveRequest) -> Result<Vec<u8>> {
        let records = self.source.fetch_all().await?;
        ArchiveOrchestrator::new(
            self.services.clone(),
            Arc::clone(&self.renderer),
            self.fonts.clone(),
            Arc::clone(&self.colors),
        )
        .build_archive(&records, request)
        .await
    }
}
