//! Styled text fragments used by the layout tree.
//!
//! A [`Span`] carries the inline styling report text needs, a bold weight
//! and a point size. Spans stay independent of the PDF backend until
//! [`Span::to_styled_string`] turns them into a
//! [`genpdf::style::StyledString`] at render time.

use genpdf::style::{Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    font_size: Option<u8>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns the font size in points, if overridden.
    pub fn font_size(&self) -> Option<u8> {
        self.font_size
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Overrides the font size in points.
    pub fn sized(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Converts the span into a `genpdf` styled string.
    pub fn to_styled_string(&self) -> StyledString {
        let mut style = Style::new();
        if let Some(size) = self.font_size {
            style.set_font_size(size);
        }
        if self.bold {
            style.set_bold();
        }
        StyledString::new(self.text.clone(), style)
    }
}
