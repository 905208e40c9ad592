//! Font selection and loading.
//!
//! [`FontTable`] is the pure language to family lookup handed to renderers.
//! The loading helpers resolve a family name to the `genpdf` font files in a
//! font directory.

use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::warn;

/// Environment variable overriding the font directory.
pub const FONTS_DIR_ENV: &str = "CHART_REPORT_FONTS_DIR";

/// Family used when a language has no dedicated entry.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Noto";

const FONT_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

/// Maps language names to font family identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontTable {
    default_family: String,
    languages: BTreeMap<String, String>,
}

/// Languages whose script needs a dedicated family.
pub fn default_languages() -> BTreeMap<String, String> {
    [("中文", "NotoSC"), ("日本語", "NotoJP"), ("한국어", "NotoKR")]
        .into_iter()
        .map(|(language, family)| (language.to_owned(), family.to_owned()))
        .collect()
}

impl Default for FontTable {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FAMILY_NAME, default_languages())
    }
}

impl FontTable {
    pub fn new(default_family: impl Into<String>, languages: BTreeMap<String, String>) -> Self {
        Self {
            default_family: default_family.into(),
            languages,
        }
    }

    /// Adds or replaces the family for `language`.
    pub fn with_language(mut self, language: impl Into<String>, family: impl Into<String>) -> Self {
        self.languages.insert(language.into(), family.into());
        self
    }

    /// Family for `language`; unknown languages get the default family.
    pub fn family_for(&self, language: &str) -> &str {
        self.languages
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.default_family)
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }
}

fn font_file_names(family: &str) -> Vec<String> {
    FONT_STYLES
        .iter()
        .map(|style| format!("{family}-{style}.ttf"))
        .collect()
}

/// Directories searched for font files, in order: the
/// `CHART_REPORT_FONTS_DIR` variable, the configured directory,
/// `assets/fonts` next to the executable and `assets/fonts` in the crate.
pub fn font_directory_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.iter().any(|existing| existing == &candidate) {
            candidates.push(candidate);
        }
    };

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            push(PathBuf::from(path));
        }
    }

    if let Some(dir) = configured {
        push(dir.to_path_buf());
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    candidates
}

fn missing_font_files(path: &Path, family: &str) -> Vec<String> {
    font_file_names(family)
        .into_iter()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Finds the first candidate directory holding every file of `family`.
pub fn resolve_font_directory(configured: Option<&Path>, family: &str) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(configured) {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate, family);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            format!("missing files [{}]", missing.join(", "))
        };
        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };

    Err(Error::new(
        format!(
            "Unable to locate font family '{family}'. Checked: {summary}. Set {FONTS_DIR_ENV} to a directory with the font files."
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_family(configured: Option<&Path>, family: &str) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(configured, family)?;

    fonts::from_files(&directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Loads the family `fonts` assigns to `language`, falling back to the
/// table's default family when that family's files are missing.
pub fn font_family_for_language(
    fonts: &FontTable,
    language: &str,
    configured: Option<&Path>,
) -> Result<FontFamily<FontData>, Error> {
    let family = fonts.family_for(language);
    match load_family(configured, family) {
        Ok(loaded) => Ok(loaded),
        Err(err) if fonts_missing(&err) && family != fonts.default_family() => {
            warn!(
                "Font family '{}' for {} unavailable ({}); falling back to '{}'.",
                family,
                language,
                err,
                fonts.default_family()
            );
            load_family(configured, fonts.default_family())
        }
        Err(err) => Err(err),
    }
}

/// Indicates whether the default family of `fonts` can be found on disk.
pub fn default_fonts_available(fonts: &FontTable, configured: Option<&Path>) -> bool {
    resolve_font_directory(configured, fonts.default_family()).is_ok()
}
