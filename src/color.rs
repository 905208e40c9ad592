//! Colour values and the strategies that assign them to distribution entries.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ReportError;

/// An sRGB colour, written as `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for genpdf::style::Color {
    fn from(color: Rgb) -> Self {
        genpdf::style::Color::Rgb(color.r, color.g, color.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ReportError::InvalidArgument(format!("invalid colour '{value}'"));
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Picks the colour of one distribution entry.
///
/// Colours carry no meaning; the aggregator calls the strategy once per
/// entry, in output order.
pub trait ColorStrategy: Send + Sync {
    fn color_for(&self, label: &str, index: usize) -> Rgb;
}

/// Uniformly random colours, a fresh draw on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomColors;

impl ColorStrategy for RandomColors {
    fn color_for(&self, _label: &str, _index: usize) -> Rgb {
        let mut rng = rand::thread_rng();
        Rgb::new(rng.gen(), rng.gen(), rng.gen())
    }
}

/// Stable colours derived from a digest of the label.
#[derive(Clone, Copy, Debug, Default)]
pub struct LabelHashColors;

impl ColorStrategy for LabelHashColors {
    fn color_for(&self, label: &str, _index: usize) -> Rgb {
        let digest = Sha256::digest(label.as_bytes());
        Rgb::new(digest[0], digest[1], digest[2])
    }
}

/// Cycles through a fixed list of colours by entry position.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Creates a palette; an empty list falls back to black.
    pub fn new(colors: impl Into<Vec<Rgb>>) -> Self {
        Self {
            colors: colors.into(),
        }
    }
}

impl ColorStrategy for Palette {
    fn color_for(&self, _label: &str, index: usize) -> Rgb {
        if self.colors.is_empty() {
            return Rgb::default();
        }
        self.colors[index % self.colors.len()]
    }
}
