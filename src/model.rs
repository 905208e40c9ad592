//! Data structures describing the logical layout of a report document.
//!
//! The types in this module form the layout tree handed to a
//! [`Renderer`](crate::services::Renderer). They avoid referencing the
//! rendering crate directly so that a layout can be inspected in tests or
//! passed to another backend. Lengths are PDF points.

use std::fmt;
use std::sync::Arc;

use crate::color::Rgb;
use crate::geometry::PieSlice;
use crate::richtext::Span;

/// Horizontal alignment of text blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Legends, captions and the narrative.
    #[default]
    Left,
    /// Page headers and footers.
    Center,
}

/// Rich text paragraph carrying inline styling information and alignment
/// metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
    space_after: f64,
}

impl RichParagraph {
    /// Creates a paragraph from the provided spans using left alignment.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Returns the spans that make up the paragraph.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Concatenated text of every span.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Vertical gap below the paragraph.
    pub fn space_after(&self) -> f64 {
        self.space_after
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the gap below the paragraph and returns the updated paragraph.
    pub fn with_space_after(mut self, points: f64) -> Self {
        self.space_after = points;
        self
    }
}

/// Donut chart drawn from precomputed slices.
#[derive(Clone, Debug, PartialEq)]
pub struct PieChartBlock {
    pub slices: Vec<PieSlice>,
    pub stroke_width: f64,
}

/// A filled horizontal bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarBlock {
    pub length: f64,
    pub height: f64,
    pub color: Rgb,
}

/// Side-by-side columns sized by relative weights.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnsBlock {
    weights: Vec<usize>,
    columns: Vec<Vec<Block>>,
}

impl ColumnsBlock {
    /// Creates an empty set of columns; every weight must be non-zero.
    pub fn new(weights: impl Into<Vec<usize>>) -> Self {
        let weights = weights.into();
        let columns = vec![Vec::new(); weights.len()];
        Self { weights, columns }
    }

    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    pub fn columns(&self) -> &[Vec<Block>] {
        &self.columns
    }

    /// Appends `block` to column `index`; out-of-range indices are ignored.
    pub fn with_block(mut self, index: usize, block: Block) -> Self {
        if let Some(column) = self.columns.get_mut(index) {
            column.push(block);
        }
        self
    }
}

/// Individual content blocks that make up a report.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Styled paragraph content.
    Paragraph(RichParagraph),
    PieChart(PieChartBlock),
    Bar(BarBlock),
    /// Square colour sample used by legends.
    Swatch { color: Rgb, size: f64 },
    Columns(ColumnsBlock),
    /// Blocks laid out top to bottom.
    Stack(Vec<Block>),
    /// Vertical gap.
    Spacer(f64),
    /// Explicit page break request.
    PageBreak,
}

impl Block {
    /// Single-span paragraph.
    pub fn text(span: Span) -> Self {
        Self::Paragraph(RichParagraph::new(vec![span]))
    }

    /// Collects the text of every paragraph in this block, depth first.
    pub fn texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts(&self, out: &mut Vec<String>) {
        match self {
            Block::Paragraph(paragraph) => out.push(paragraph.text()),
            Block::Columns(columns) => columns
                .columns()
                .iter()
                .flatten()
                .for_each(|block| block.collect_texts(out)),
            Block::Stack(blocks) => blocks.iter().for_each(|block| block.collect_texts(out)),
            Block::PieChart(_)
            | Block::Bar(_)
            | Block::Swatch { .. }
            | Block::Spacer(_)
            | Block::PageBreak => {}
        }
    }
}

/// Produces the footer block for a 1-based page number.
pub type PageBlockFn = dyn Fn(usize) -> Block + Send + Sync;

/// Footer slot: either the same block on every page or one built per page.
#[derive(Clone)]
pub enum Footer {
    Static(Block),
    PerPage(Arc<PageBlockFn>),
}

impl Footer {
    /// Builds a per-page footer from a closure.
    pub fn per_page<F>(factory: F) -> Self
    where
        F: Fn(usize) -> Block + Send + Sync + 'static,
    {
        Self::PerPage(Arc::new(factory))
    }

    /// Returns the block to draw on `page` (1-based).
    pub fn block_for_page(&self, page: usize) -> Block {
        match self {
            Footer::Static(block) => block.clone(),
            Footer::PerPage(factory) => factory(page),
        }
    }
}

impl fmt::Debug for Footer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Footer::Static(block) => f.debug_tuple("Static").field(block).finish(),
            Footer::PerPage(_) => f.write_str("PerPage(..)"),
        }
    }
}

impl From<Block> for Footer {
    fn from(block: Block) -> Self {
        Footer::Static(block)
    }
}

/// The assembled document: ordered body blocks plus optional page furniture.
#[derive(Clone, Debug, Default)]
pub struct ReportLayout {
    pub language: String,
    pub header: Option<Block>,
    pub footer: Option<Footer>,
    pub blocks: Vec<Block>,
}

impl ReportLayout {
    /// Every paragraph text of the body, in order.
    pub fn body_texts(&self) -> Vec<String> {
        self.blocks.iter().flat_map(Block::texts).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_ignore_out_of_range_index() {
        let columns = ColumnsBlock::new(vec![7, 3])
            .with_block(0, Block::Spacer(1.0))
            .with_block(5, Block::PageBreak);
        assert_eq!(columns.columns()[0].len(), 1);
        assert!(columns.columns()[1].is_empty());
    }

    #[test]
    fn texts_walk_nested_blocks() {
        let block = Block::Columns(
            ColumnsBlock::new(vec![1, 1])
                .with_block(0, Block::text(Span::new("left")))
                .with_block(
                    1,
                    Block::Stack(vec![
                        Block::text(Span::new("title")),
                        Block::Swatch {
                            color: Rgb::default(),
                            size: 15.0,
                        },
                        Block::Paragraph(RichParagraph::new(vec![
                            Span::new("a"),
                            Span::new("b").bold(),
                        ])),
                    ]),
                ),
        );
        assert_eq!(block.texts(), vec!["left", "title", "ab"]);
    }

    #[test]
    fn per_page_footer_receives_page_number() {
        let footer = Footer::per_page(|page| Block::text(Span::new(format!("Page {page}"))));
        assert_eq!(footer.block_for_page(3).texts(), vec!["Page 3"]);
        assert_eq!(format!("{footer:?}"), "PerPage(..)");
    }
}
