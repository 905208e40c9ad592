//! Chart elements built on top of `genpdf` drawing primitives.
//!
//! `genpdf` can only stroke lines, so filled shapes are drawn as single
//! strokes as thick as the shape: bars and swatches are one horizontal
//! stroke, donut slices are polylines along the ring's centre line with the
//! ring width as thickness.

use genpdf::error::Error;
use genpdf::style::{LineStyle, Style};
use genpdf::{render, Element, Mm, Position, RenderResult, Size};

use crate::color::Rgb;
use crate::geometry::PieSlice;

const MM_PER_POINT: f64 = 25.4 / 72.0;
/// Angular resolution of donut arcs.
const ARC_STEP_DEG: f64 = 2.0;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts a length in PDF points to millimetres.
pub fn mm_from_points(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_POINT)
}

fn min_mm(a: Mm, b: Mm) -> Mm {
    if a > b {
        b
    } else {
        a
    }
}

fn does_not_fit() -> RenderResult {
    let mut result = RenderResult::default();
    result.has_more = true;
    result
}

/// Donut chart centred horizontally in the available width.
pub struct DonutChart {
    slices: Vec<PieSlice>,
    stroke_width: f64,
    extent: f64,
}

impl DonutChart {
    /// `stroke_width` and the slice radii are in points.
    pub fn new(slices: Vec<PieSlice>, stroke_width: f64) -> Self {
        let radius = slices.first().map(|slice| slice.radius).unwrap_or(0.0);
        Self {
            slices,
            stroke_width,
            extent: 2.0 * radius + stroke_width,
        }
    }
}

impl Element for DonutChart {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let extent = mm_from_points(self.extent);
        let available = area.size();
        if extent > available.height {
            return Ok(does_not_fit());
        }

        let half_extent = mm_to_f64(extent) / 2.0;
        let center_x = mm_to_f64(available.width) / 2.0;
        let center_y = half_extent;
        let thickness = mm_from_points(self.stroke_width);

        for slice in self.slices.iter().filter(|slice| slice.is_visible()) {
            let points: Vec<Position> = slice
                .arc_points(ARC_STEP_DEG)
                .into_iter()
                .map(|(x, y)| {
                    Position::new(
                        mm_from_f64(center_x + x * MM_PER_POINT),
                        mm_from_f64(center_y + y * MM_PER_POINT),
                    )
                })
                .collect();
            area.draw_line(
                points,
                LineStyle::new()
                    .with_thickness(thickness)
                    .with_color(slice.color.into()),
            );
        }

        let mut result = RenderResult::default();
        result.size = Size::new(available.width, extent);
        Ok(result)
    }
}

/// Solid rectangle anchored at the left edge, used for bars and legend swatches.
pub struct FilledRect {
    width: f64,
    height: f64,
    color: Rgb,
}

impl FilledRect {
    /// Dimensions are in points.
    pub fn new(width: f64, height: f64, color: Rgb) -> Self {
        Self {
            width,
            height,
            color,
        }
    }
}

impl Element for FilledRect {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let height = mm_from_points(self.height);
        let available = area.size();
        if height > available.height {
            return Ok(does_not_fit());
        }

        let width = min_mm(mm_from_points(self.width), available.width);
        if mm_to_f64(width) > 0.0 {
            let middle = mm_from_f64(mm_to_f64(height) / 2.0);
            area.draw_line(
                vec![Position::new(0, middle), Position::new(width, middle)],
                LineStyle::new()
                    .with_thickness(height)
                    .with_color(self.color.into()),
            );
        }

        let mut result = RenderResult::default();
        result.size = Size::new(width, height);
        Ok(result)
    }
}

/// Empty vertical space.
pub struct Gap {
    height: f64,
}

impl Gap {
    /// `height` is in points.
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl Element for Gap {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let height = min_mm(mm_from_points(self.height), area.size().height);
        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}
