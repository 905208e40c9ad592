//! Chart-aware report builder.
//!
//! A [`ReportDocument`] accumulates body blocks plus a header and footer slot
//! for a single report. Fixed UI strings ("Legend", "Bar Chart") and the
//! analysis narrative are written in the pipeline's default language and
//! passed through the [`Translator`] only when the document targets another
//! language.

use std::sync::Arc;

use log::debug;

use crate::aggregate::Distribution;
use crate::config::LayoutConfig;
use crate::error::{ReportError, Result};
use crate::fonts::FontTable;
use crate::geometry::{bar_lengths, pie_slices};
use crate::model::{
    BarBlock, Block, ColumnsBlock, Footer, HorizontalAlignment, PieChartBlock, ReportLayout,
    RichParagraph,
};
use crate::richtext::Span;
use crate::services::{Analyzer, Renderer, Translator};

pub const LEGEND_TITLE: &str = "Legend";
pub const BAR_CHART_TITLE: &str = "Bar Chart";

const CHART_COLUMN_WEIGHTS: [usize; 2] = [7, 3];
const LEGEND_ITEM_WEIGHTS: [usize; 2] = [1, 5];
const SWATCH_SIZE: f64 = 15.0;

/// Translates text into one target language, skipping the round trip when
/// the target is the default language.
#[derive(Clone)]
pub struct Localizer {
    translator: Arc<dyn Translator>,
    default_language: String,
    language: String,
}

impl Localizer {
    pub fn new(
        translator: Arc<dyn Translator>,
        default_language: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            translator,
            default_language: default_language.into(),
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_default_language(&self) -> bool {
        self.language == self.default_language
    }

    /// Returns `text` verbatim for the default language, otherwise its translation.
    pub async fn localize(&self, text: &str) -> Result<String> {
        if self.is_default_language() {
            return Ok(text.to_owned());
        }
        self.translator
            .translate(text, &self.language)
            .await
            .map_err(ReportError::dependency)
    }
}

/// Collaborators and settings shared by every document of a pipeline.
#[derive(Clone)]
pub struct DocumentServices {
    pub translator: Arc<dyn Translator>,
    pub analyzer: Arc<dyn Analyzer>,
    pub default_language: String,
    pub layout: LayoutConfig,
}

/// Builder for one localized chart report.
pub struct ReportDocument {
    localizer: Localizer,
    analyzer: Arc<dyn Analyzer>,
    layout: LayoutConfig,
    header: Option<Block>,
    footer: Option<Footer>,
    blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new(services: &DocumentServices, language: impl Into<String>) -> Self {
        Self {
            localizer: Localizer::new(
                Arc::clone(&services.translator),
                services.default_language.clone(),
                language,
            ),
            analyzer: Arc::clone(&services.analyzer),
            layout: services.layout,
            header: None,
            footer: None,
            blocks: Vec::new(),
        }
    }

    pub fn language(&self) -> &str {
        self.localizer.language()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn header(&self) -> Option<&Block> {
        self.header.as_ref()
    }

    pub fn footer(&self) -> Option<&Footer> {
        self.footer.as_ref()
    }

    /// Text in the document's language; translator failures become
    /// [`ReportError::RenderDependency`].
    pub async fn localize(&self, text: &str) -> Result<String> {
        self.localizer.localize(text).await
    }

    /// Replaces the header slot.
    pub fn set_header(&mut self, header: Block) {
        self.header = Some(header);
    }

    /// Replaces the footer slot with a static block or a per-page closure.
    pub fn set_footer(&mut self, footer: impl Into<Footer>) {
        self.footer = Some(footer.into());
    }

    /// Appends a donut chart with a legend to its right.
    pub async fn add_chart_block(&mut self, distribution: &Distribution) -> Result<()> {
        let title = self.localizer.localize(LEGEND_TITLE).await?;

        let mut legend = vec![Block::Paragraph(
            RichParagraph::new(vec![Span::new(title).bold().sized(16)]).with_space_after(10.0),
        )];
        legend.extend(distribution.iter().map(|entry| {
            Block::Columns(
                ColumnsBlock::new(LEGEND_ITEM_WEIGHTS)
                    .with_block(
                        0,
                        Block::Swatch {
                            color: entry.color,
                            size: SWATCH_SIZE,
                        },
                    )
                    .with_block(1, Block::text(Span::new(entry.label.clone()))),
            )
        }));

        let chart = PieChartBlock {
            slices: pie_slices(distribution, self.layout.pie_radius),
            stroke_width: self.layout.pie_stroke,
        };

        self.blocks.push(Block::Columns(
            ColumnsBlock::new(CHART_COLUMN_WEIGHTS)
                .with_block(0, Block::PieChart(chart))
                .with_block(1, Block::Stack(legend)),
        ));
        debug!("added chart block with {} entries", distribution.len());
        Ok(())
    }

    /// Appends a titled list of proportional bars, each captioned
    /// `"<label> - <percentage>%"`.
    pub async fn add_bar_block(&mut self, distribution: &Distribution) -> Result<()> {
        let title = self.localizer.localize(BAR_CHART_TITLE).await?;

        let mut stack = vec![Block::Paragraph(
            RichParagraph::new(vec![Span::new(title).bold().sized(14)])
                .with_alignment(HorizontalAlignment::Center)
                .with_space_after(20.0),
        )];
        for bar in bar_lengths(distribution, self.layout.bar_width) {
            stack.push(Block::Bar(BarBlock {
                length: bar.length,
                height: self.layout.bar_height,
                color: bar.color,
            }));
            stack.push(Block::Paragraph(
                RichParagraph::new(vec![Span::new(bar.caption()).bold().sized(12)])
                    .with_space_after(20.0),
            ));
        }

        self.blocks.push(Block::Stack(stack));
        Ok(())
    }

    /// Appends a one-sentence analysis of the distribution.
    pub async fn add_narrative_block(&mut self, distribution: &Distribution) -> Result<()> {
        let analysis = self
            .analyzer
            .analyze(distribution)
            .await
            .map_err(ReportError::dependency)?;
        let narrative = self.localizer.localize(analysis.trim()).await?;

        self.blocks.push(Block::Paragraph(
            RichParagraph::new(vec![Span::new(narrative).bold().sized(14)])
                .with_alignment(HorizontalAlignment::Center)
                .with_space_after(20.0),
        ));
        Ok(())
    }

    /// Snapshot of the assembled document.
    pub fn layout(&self) -> ReportLayout {
        ReportLayout {
            language: self.localizer.language().to_owned(),
            header: self.header.clone(),
            footer: self.footer.clone(),
            blocks: self.blocks.clone(),
        }
    }

    /// Hands the assembled layout to `renderer`. The builder is left untouched.
    pub async fn render(&self, renderer: &dyn Renderer, fonts: &FontTable) -> Result<Vec<u8>> {
        renderer.render(&self.layout(), fonts).await
    }
}

/// Centered bold heading used as the page header.
pub fn header_block(text: impl Into<String>) -> Block {
    Block::Paragraph(
        RichParagraph::new(vec![Span::new(text).bold().sized(18)])
            .with_alignment(HorizontalAlignment::Center)
            .with_space_after(10.0),
    )
}

/// Footer showing the page number.
pub fn page_number_footer() -> Footer {
    Footer::per_page(|page| {
        Block::Paragraph(
            RichParagraph::new(vec![Span::new(format!("Page {page}")).sized(10)])
                .with_alignment(HorizontalAlignment::Center),
        )
    })
}
