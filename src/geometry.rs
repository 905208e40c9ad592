//! Pure chart geometry for pie (donut) and bar charts.
//!
//! All lengths are in PDF points. A pie slice is described the way a dashed
//! circle stroke would draw it: an arc length along the circumference and the
//! running offset at which it starts, measured clockwise from 12 o'clock.

use std::f64::consts::PI;

use crate::aggregate::Distribution;
use crate::color::Rgb;

/// Radius of the donut's centre line.
pub const PIE_RADIUS: f64 = 80.0;
/// Width of the donut ring.
pub const PIE_STROKE_WIDTH: f64 = 40.0;
/// Usable width of an A4 page with 40pt side margins.
pub const BAR_TOTAL_WIDTH: f64 = 515.28;
pub const BAR_HEIGHT: f64 = 10.0;
/// Slices start at 12 o'clock.
pub const PIE_START_ANGLE_DEG: f64 = -90.0;

/// Circumference of a circle with the given radius.
pub fn circumference(radius: f64) -> f64 {
    2.0 * PI * radius
}

/// One arc of the donut chart.
#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub color: Rgb,
    /// Arc length preceding this slice.
    pub offset: f64,
    /// Arc length of this slice.
    pub length: f64,
    pub radius: f64,
}

impl PieSlice {
    /// Start angle in degrees, with 0 at 3 o'clock and growing clockwise.
    pub fn start_angle(&self) -> f64 {
        PIE_START_ANGLE_DEG + self.offset / circumference(self.radius) * 360.0
    }

    pub fn sweep_angle(&self) -> f64 {
        self.length / circumference(self.radius) * 360.0
    }

    /// Zero-length slices draw nothing.
    pub fn is_visible(&self) -> bool {
        self.length > 0.0
    }

    /// Points along the slice's centre line, relative to the circle centre,
    /// with y growing downwards. One point every `step_deg` degrees plus both
    /// end points.
    pub fn arc_points(&self, step_deg: f64) -> Vec<(f64, f64)> {
        if !self.is_visible() {
            return Vec::new();
        }
        let start = self.start_angle();
        let sweep = self.sweep_angle();
        let steps = (sweep / step_deg.max(0.1)).ceil().max(1.0) as usize;
        (0..=steps)
            .map(|step| {
                let angle = (start + sweep * step as f64 / steps as f64).to_radians();
                (self.radius * angle.cos(), self.radius * angle.sin())
            })
            .collect()
    }
}

/// Lays the distribution out around a circle of `radius`.
///
/// Each slice's arc is `percentage / 100 * circumference` and starts where
/// the previous one ended. Rounding drift is not corrected, so the last
/// slice need not close the circle exactly.
pub fn pie_slices(distribution: &Distribution, radius: f64) -> Vec<PieSlice> {
    let circumference = circumference(radius);
    let mut offset = 0.0;
    distribution
        .iter()
        .map(|entry| {
            let length = (entry.percentage / 100.0 * circumference).max(0.0);
            let slice = PieSlice {
                label: entry.label.clone(),
                color: entry.color,
                offset,
                length,
                radius,
            };
            offset += length;
            slice
        })
        .collect()
}

/// One horizontal bar.
#[derive(Clone, Debug, PartialEq)]
pub struct BarSegment {
    pub label: String,
    pub percentage: f64,
    pub color: Rgb,
    pub length: f64,
}

impl BarSegment {
    /// Inline caption drawn under the bar.
    pub fn caption(&self) -> String {
        format!("{} - {}%", self.label, self.percentage)
    }
}

/// Scales each entry to `percentage / 100 * total_width`, independently of
/// its neighbours.
pub fn bar_lengths(distribution: &Distribution, total_width: f64) -> Vec<BarSegment> {
    distribution
        .iter()
        .map(|entry| BarSegment {
            label: entry.label.clone(),
            percentage: entry.percentage,
            color: entry.color,
            length: (entry.percentage / 100.0 * total_width).max(0.0),
        })
        .collect()
}
