//! Pipeline configuration loaded from TOML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::fonts::{self, FontTable, DEFAULT_FONT_FAMILY_NAME};
use crate::geometry::{BAR_HEIGHT, BAR_TOTAL_WIDTH, PIE_RADIUS, PIE_STROKE_WIDTH};

/// Default configuration embedded in the crate.
pub const DEFAULT_CONFIG: &str = r#"
default_language = "English"

[fonts]
default_family = "Noto"

[fonts.languages]
"中文" = "NotoSC"
"日本語" = "NotoJP"
"한국어" = "NotoKR"

[layout]
pie_radius = 80.0
pie_stroke = 40.0
bar_width = 515.28
bar_height = 10.0

[storage]
public_base_url = "http://localhost/documents"

[ollama]
url = "http://localhost:11434"
model = "llama3:8b"
keep_alive = "15m"
timeout_secs = 120
"#;

#[derive(Clone, Debug, Deserialize)]
pub struct ReportConfig {
    /// Language the fixed UI strings and the analysis are written in.
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FontConfig {
    /// Directory holding `<Family>-Regular.ttf` and friends.
    pub dir: Option<PathBuf>,
    #[serde(default = "default_font_family")]
    pub default_family: String,
    /// Replaces the built-in table when present.
    #[serde(default = "fonts::default_languages")]
    pub languages: BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LayoutConfig {
    pub pie_radius: f64,
    pub pie_stroke: f64,
    pub bar_width: f64,
    pub bar_height: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub public_base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub keep_alive: String,
    pub timeout_secs: u64,
}

fn default_language() -> String {
    "English".to_owned()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY_NAME.to_owned()
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dir: None,
            default_family: default_font_family(),
            languages: fonts::default_languages(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pie_radius: PIE_RADIUS,
            pie_stroke: PIE_STROKE_WIDTH,
            bar_width: BAR_TOTAL_WIDTH,
            bar_height: BAR_HEIGHT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost/documents".to_owned(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_owned(),
            model: "llama3:8b".to_owned(),
            keep_alive: "15m".to_owned(),
            timeout_secs: 120,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        // The embedded document is covered by a unit test.
        Self::from_toml_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            default_language: default_language(),
            fonts: FontConfig::default(),
            layout: LayoutConfig::default(),
            storage: StorageConfig::default(),
            ollama: OllamaConfig::default(),
        })
    }
}

impl ReportConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ReportConfig = toml::from_str(contents)
            .map_err(|err| ReportError::InvalidArgument(format!("invalid configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the embedded defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("{} not found, using embedded configuration", path.display());
            return Self::from_toml_str(DEFAULT_CONFIG);
        }
        info!("loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|err| {
            ReportError::InvalidArgument(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<()> {
        if self.default_language.trim().is_empty() {
            return Err(ReportError::InvalidArgument(
                "default_language must not be empty".into(),
            ));
        }
        let layout = &self.layout;
        let lengths = [
            layout.pie_radius,
            layout.pie_stroke,
            layout.bar_width,
            layout.bar_height,
        ];
        if lengths.iter().any(|value| !value.is_finite() || *value <= 0.0) {
            return Err(ReportError::InvalidArgument(
                "layout lengths must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Language to font family lookup built from the `[fonts]` section.
    pub fn font_table(&self) -> FontTable {
        FontTable::new(self.fonts.default_family.clone(), self.fonts.languages.clone())
    }
}
