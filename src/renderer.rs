//! [`Renderer`] implementation producing PDF bytes with `genpdf`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use genpdf::elements::{LinearLayout, PageBreak, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{
    Alignment, Context, Document, Element, Margins, Mm, PageDecorator, PaperSize, Position,
};
use log::debug;

use crate::config::ReportConfig;
use crate::elements::{mm_from_points, DonutChart, FilledRect, Gap};
use crate::error::{ReportError, Result};
use crate::fonts::{self, FontTable};
use crate::model::{Block, Footer, HorizontalAlignment, ReportLayout, RichParagraph};
use crate::services::Renderer;

/// Page margins, matching the 515.28pt bar width on A4.
const PAGE_MARGIN_PT: f64 = 40.0;
const FOOTER_HEIGHT_PT: f64 = 24.0;
const BASE_FONT_SIZE: u8 = 11;

/// Renders report layouts to A4 PDF documents.
#[derive(Clone, Debug, Default)]
pub struct GenpdfRenderer {
    fonts_dir: Option<PathBuf>,
    title: Option<String>,
}

impl GenpdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer searching the `[fonts] dir` of `config`.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            fonts_dir: config.fonts.dir.clone(),
            title: None,
        }
    }

    /// Directory searched for font files after `CHART_REPORT_FONTS_DIR`.
    pub fn with_fonts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fonts_dir = Some(dir.into());
        self
    }

    /// Title written into the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn fonts_dir(&self) -> Option<&Path> {
        self.fonts_dir.as_deref()
    }

    /// Renders synchronously on the calling thread.
    pub fn render_blocking(&self, layout: &ReportLayout, fonts: &FontTable) -> Result<Vec<u8>> {
        let family =
            fonts::font_family_for_language(fonts, &layout.language, self.fonts_dir.as_deref())?;

        let mut document = Document::new(family);
        document.set_paper_size(PaperSize::A4);
        document.set_font_size(BASE_FONT_SIZE);
        if let Some(title) = &self.title {
            document.set_title(title.clone());
        }
        document.set_page_decorator(PageFurniture::new(layout));

        for block in &layout.blocks {
            document.push(block_element(block)?);
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        debug!(
            "rendered {} blocks ({}) into {} bytes",
            layout.blocks.len(),
            layout.language,
            bytes.len()
        );
        Ok(bytes)
    }
}

#[async_trait]
impl Renderer for GenpdfRenderer {
    async fn render(&self, layout: &ReportLayout, fonts: &FontTable) -> Result<Vec<u8>> {
        let renderer = self.clone();
        let layout = layout.clone();
        let fonts = fonts.clone();
        tokio::task::spawn_blocking(move || renderer.render_blocking(&layout, &fonts))
            .await
            .map_err(|err| ReportError::RenderFailure(format!("render task aborted: {err}")))?
    }
}

/// Report header and footer drawn inside the page margins of every page.
///
/// The footer sits in a fixed strip at the bottom; the header takes the
/// height it needs at the top. What remains is the body area.
struct PageFurniture {
    page: usize,
    header: Option<Block>,
    footer: Option<Footer>,
    footer_height: Mm,
}

impl PageFurniture {
    fn new(layout: &ReportLayout) -> Self {
        Self {
            page: 0,
            header: layout.header.clone(),
            footer: layout.footer.clone(),
            footer_height: mm_from_points(FOOTER_HEIGHT_PT),
        }
    }

    fn draw_footer(
        &self,
        footer: &Footer,
        context: &Context,
        area: &mut Area<'_>,
        style: Style,
    ) -> Result<(), Error> {
        let height = area.size().height;
        if self.footer_height > height {
            return Err(Error::new(
                format!("no room for the footer on page {}", self.page),
                ErrorKind::PageSizeExceeded,
            ));
        }
        let body_height = height - self.footer_height;

        let mut strip = area.clone();
        strip.add_offset(Position::new(0, body_height));
        let mut element = block_element(&footer.block_for_page(self.page))?;
        if element.render(context, strip, style)?.has_more {
            return Err(Error::new(
                format!("footer of page {} overflows its strip", self.page),
                ErrorKind::PageSizeExceeded,
            ));
        }
        area.set_height(body_height);
        Ok(())
    }
}

impl PageDecorator for PageFurniture {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        self.page += 1;
        area.add_margins(Margins::all(mm_from_points(PAGE_MARGIN_PT)));

        if let Some(footer) = &self.footer {
            self.draw_footer(footer, context, &mut area, style)?;
        }
        if let Some(header) = &self.header {
            let mut element = block_element(header)?;
            let drawn = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, drawn.size.height));
        }
        Ok(area)
    }
}

fn alignment(value: HorizontalAlignment) -> Alignment {
    match value {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
    }
}

fn paragraph_element(rich: &RichParagraph) -> Box<dyn Element> {
    let mut paragraph = Paragraph::default();
    for span in rich.spans() {
        paragraph.push(span.to_styled_string());
    }
    paragraph.set_alignment(alignment(rich.alignment()));

    if rich.space_after() > 0.0 {
        let gap = mm_from_points(rich.space_after());
        Box::new(paragraph.padded(Margins::trbl(0, 0, gap, 0)))
    } else {
        Box::new(paragraph)
    }
}

fn stack_element(blocks: &[Block]) -> Result<LinearLayout, Error> {
    let mut layout = LinearLayout::vertical();
    for block in blocks {
        layout.push(block_element(block)?);
    }
    Ok(layout)
}

/// Converts one layout block into a `genpdf` element tree.
pub fn block_element(block: &Block) -> Result<Box<dyn Element>, Error> {
    let element: Box<dyn Element> = match block {
        Block::Paragraph(rich) => paragraph_element(rich),
        Block::PieChart(chart) => Box::new(DonutChart::new(chart.slices.clone(), chart.stroke_width)),
        Block::Bar(bar) => Box::new(FilledRect::new(bar.length, bar.height, bar.color)),
        Block::Swatch { color, size } => Box::new(FilledRect::new(*size, *size, *color)),
        Block::Columns(columns) => {
            let mut table = TableLayout::new(columns.weights().to_vec());
            let mut row = table.row();
            for column in columns.columns() {
                row.push_element(stack_element(column)?);
            }
            row.push()?;
            Box::new(table)
        }
        Block::Stack(blocks) => Box::new(stack_element(blocks)?),
        Block::Spacer(height) => Box::new(Gap::new(*height)),
        Block::PageBreak => Box::new(PageBreak::new()),
    };
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Distribution, DistributionEntry};
    use crate::color::Rgb;
    use crate::geometry::pie_slices;
    use crate::model::{ColumnsBlock, PieChartBlock};
    use crate::richtext::Span;

    fn fixture_fonts() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fonts")
    }

    fn fixture_table() -> FontTable {
        FontTable::new("DejaVuSansMono", Default::default())
    }

    #[test]
    fn every_block_kind_converts() {
        let blocks = vec![
            Block::text(Span::new("hello")),
            Block::Spacer(12.0),
            Block::PageBreak,
            Block::Columns(
                ColumnsBlock::new(vec![7, 3])
                    .with_block(0, Block::Spacer(1.0))
                    .with_block(1, Block::Stack(vec![Block::text(Span::new("legend"))])),
            ),
        ];
        for block in &blocks {
            assert!(block_element(block).is_ok());
        }
    }

    #[test]
    fn config_supplies_the_font_directory() {
        let config =
            ReportConfig::from_toml_str("[fonts]\ndir = \"/opt/report-fonts\"").unwrap();
        let renderer = GenpdfRenderer::from_config(&config);
        assert_eq!(renderer.fonts_dir(), Some(Path::new("/opt/report-fonts")));
        assert_eq!(GenpdfRenderer::from_config(&ReportConfig::default()).fonts_dir(), None);
    }

    #[test]
    fn charts_and_page_furniture_render() {
        let distribution = Distribution::from_entries(vec![
            DistributionEntry::new("a", 60.0, Rgb::new(200, 30, 30)),
            DistributionEntry::new("b", 40.0, Rgb::new(30, 30, 200)),
        ])
        .unwrap();
        let chart = Block::PieChart(PieChartBlock {
            slices: pie_slices(&distribution, 80.0),
            stroke_width: 40.0,
        });
        let layout = ReportLayout {
            language: "English".into(),
            header: Some(Block::text(Span::new("Header").bold())),
            footer: Some(Footer::per_page(|page| {
                Block::text(Span::new(format!("Page {page}")))
            })),
            blocks: vec![
                chart,
                Block::Swatch {
                    color: Rgb::new(1, 2, 3),
                    size: 15.0,
                },
                Block::PageBreak,
                Block::text(Span::new("second page")),
            ],
        };

        let bytes = GenpdfRenderer::new()
            .with_fonts_dir(fixture_fonts())
            .render_blocking(&layout, &fixture_table())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
