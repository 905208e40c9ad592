//! Multi-category export: one rendered report per category, zipped together.
//!
//! Headers and labels are translated in two batched calls keyed by category
//! name. A category whose batch result is missing or has the wrong shape keeps
//! its original text; every other failure aborts the whole archive.

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use futures::future::try_join_all;
use log::{info, warn};
use serde::Deserialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::aggregate::{aggregate, Distribution};
use crate::color::ColorStrategy;
use crate::document::{header_block, page_number_footer, DocumentServices, ReportDocument};
use crate::error::{ReportError, Result};
use crate::fonts::FontTable;
use crate::record::{CategorySelector, ChartType, SubjectRecord};
use crate::services::{Renderer, TextBatch};

/// Raw archive parameters as received from a caller.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveParams {
    pub primary_chart_type: String,
    pub categories: Vec<String>,
    pub language: String,
}

/// A validated archive request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveRequest {
    chart_type: ChartType,
    categories: BTreeSet<CategorySelector>,
    language: String,
}

impl ArchiveRequest {
    pub fn new(
        chart_type: ChartType,
        categories: impl IntoIterator<Item = CategorySelector>,
        language: impl Into<String>,
    ) -> Result<Self> {
        let categories: BTreeSet<_> = categories.into_iter().collect();
        if categories.is_empty() {
            return Err(ReportError::InvalidArgument(
                "an archive needs at least one category".into(),
            ));
        }
        let language = language.into();
        if language.trim().is_empty() {
            return Err(ReportError::InvalidArgument(
                "archive language must not be empty".into(),
            ));
        }
        Ok(Self {
            chart_type,
            categories,
            language,
        })
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Categories in enumeration order.
    pub fn categories(&self) -> impl Iterator<Item = CategorySelector> + '_ {
        self.categories.iter().copied()
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl TryFrom<ArchiveParams> for ArchiveRequest {
    type Error = ReportError;

    fn try_from(params: ArchiveParams) -> Result<Self> {
        let chart_type = params.primary_chart_type.parse()?;
        let categories = params
            .categories
            .iter()
            .map(|category| category.parse())
            .collect::<Result<Vec<CategorySelector>>>()?;
        Self::new(chart_type, categories, params.language)
    }
}

/// Name of the zip entry holding `category`'s report.
pub fn entry_name(category: CategorySelector) -> String {
    format!("{}.pdf", category.as_str())
}

/// Per-category inputs of one archive document.
struct CategoryPlan {
    category: CategorySelector,
    header: String,
    original: Distribution,
    localized: Distribution,
}

/// Builds zip archives of per-category reports.
#[derive(Clone)]
pub struct ArchiveOrchestrator {
    services: DocumentServices,
    renderer: Arc<dyn Renderer>,
    fonts: FontTable,
    colors: Arc<dyn ColorStrategy>,
}

impl ArchiveOrchestrator {
    pub fn new(
        services: DocumentServices,
        renderer: Arc<dyn Renderer>,
        fonts: FontTable,
        colors: Arc<dyn ColorStrategy>,
    ) -> Self {
        Self {
            services,
            renderer,
            fonts,
            colors,
        }
    }

    /// Renders one report per requested category and returns the zip bytes.
    ///
    /// Nothing is returned unless every category rendered.
    pub async fn build_archive(
        &self,
        records: &[SubjectRecord],
        request: &ArchiveRequest,
    ) -> Result<Vec<u8>> {
        if records.is_empty() {
            return Err(ReportError::EmptyInput);
        }
        info!(
            "building {:?} archive of {} categories in {}",
            request.chart_type(),
            request.categories.len(),
            request.language()
        );

        let plans = self.plan(records, request).await;
        let documents = try_join_all(
            plans
                .iter()
                .map(|plan| self.render_category(plan, request)),
        )
        .await?;

        let bytes = write_archive(&documents)?;
        info!(
            "archive with {} documents ready ({} bytes)",
            documents.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    async fn plan(&self, records: &[SubjectRecord], request: &ArchiveRequest) -> Vec<CategoryPlan> {
        let distributions: Vec<(CategorySelector, Distribution)> = request
            .categories()
            .map(|category| (category, aggregate(records, category, self.colors.as_ref())))
            .collect();

        let is_default = request.language() == self.services.default_language;
        let (headers, labels) = if is_default {
            (None, None)
        } else {
            let header_batch: TextBatch = distributions
                .iter()
                .map(|(category, _)| {
                    (
                        category.as_str().to_owned(),
                        vec![category.display_name().to_owned()],
                    )
                })
                .collect();
            let label_batch: TextBatch = distributions
                .iter()
                .map(|(category, distribution)| {
                    (category.as_str().to_owned(), distribution.labels())
                })
                .collect();
            (
                self.translate_batch(&header_batch, request.language(), "header")
                    .await,
                self.translate_batch(&label_batch, request.language(), "label")
                    .await,
            )
        };

        distributions
            .into_iter()
            .map(|(category, original)| {
                let header = translated(headers.as_ref(), category, 1)
                    .and_then(|mut header| header.pop())
                    .unwrap_or_else(|| category.display_name().to_owned());
                let localized = translated(labels.as_ref(), category, original.len())
                    .and_then(|labels| original.relabeled(labels).ok())
                    .unwrap_or_else(|| {
                        if labels.is_some() {
                            warn!(
                                "translated labels for {category} do not match; keeping original labels"
                            );
                        }
                        original.clone()
                    });
                CategoryPlan {
                    category,
                    header,
                    original,
                    localized,
                }
            })
            .collect()
    }

    async fn translate_batch(
        &self,
        batch: &TextBatch,
        language: &str,
        kind: &str,
    ) -> Option<TextBatch> {
        match self.services.translator.translate_batch(batch, language).await {
            Ok(translated) => Some(translated),
            Err(err) => {
                warn!("{kind} batch translation to {language} failed, keeping originals: {err}");
                None
            }
        }
    }

    async fn render_category(
        &self,
        plan: &CategoryPlan,
        request: &ArchiveRequest,
    ) -> Result<(CategorySelector, Vec<u8>)> {
        let mut document = ReportDocument::new(&self.services, request.language());
        document.set_header(header_block(plan.header.clone()));
        document.set_footer(page_number_footer());

        if request.chart_type().includes_pie() {
            document.add_chart_block(&plan.localized).await?;
        }
        if request.chart_type().includes_bar() {
            document.add_bar_block(&plan.localized).await?;
        }
        document.add_narrative_block(&plan.original).await?;

        let bytes = document
            .render(self.renderer.as_ref(), &self.fonts)
            .await
            .map_err(|err| match err {
                ReportError::RenderFailure(reason) => {
                    ReportError::RenderFailure(format!("{}: {reason}", plan.category))
                }
                other => other,
            })?;
        Ok((plan.category, bytes))
    }
}

/// Returns the translated list for `category` when it has `expected` items.
fn translated(
    batch: Option<&TextBatch>,
    category: CategorySelector,
    expected: usize,
) -> Option<Vec<String>> {
    batch?
        .get(category.as_str())
        .filter(|values| values.len() == expected)
        .cloned()
}

fn write_archive(documents: &[(CategorySelector, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (category, bytes) in documents {
        writer.start_file(entry_name(*category), options)?;
        writer
            .write_all(bytes)
            .map_err(|err| ReportError::RenderFailure(format!("writing {category}: {err}")))?;
    }

    Ok(writer.finish()?.into_inner())
}
