//! termfont-core - Core library for termfont
//!
//! This library provides the font record type, the traits standing in for the
//! external tools termfont drives (font enumeration, interactive selection,
//! terminal scripting), the font cache builder and the Alacritty config merge.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod alacritty;
pub mod cache;
pub mod config;
pub mod profiler;


/// Style used when a font is chosen by family alone
pub const DEFAULT_STYLE: &str = "Regular";

/// Core errors for termfont operations
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Cannot determine the home directory\n→ Suggestion: Set HOME, or point TERMFONT_CACHE_FILE and TERMFONT_ALACRITTY_CONFIG at explicit paths")]
    HomeDirectoryUnavailable,

    #[error("IO error: {0}\n→ Suggestion: Check file permissions and disk space")]
    IoError(#[from] std::io::Error),

    #[error("Font enumeration failed: {0}\n→ Suggestion: Make sure `system_profiler` is available (macOS only)")]
    EnumerationFailed(String),

    #[error("Font selector failed: {0}\n→ Suggestion: Install fzf or set TERMFONT_SELECTOR to another selector command")]
    SelectorFailed(String),

    #[error("No font selected\n→ Suggestion: Pick a font in the selector, or pass --family directly")]
    SelectionCancelled,

    #[error("Terminal scripting failed: {0}\n→ Suggestion: Make sure Terminal.app is running with at least one window")]
    ScriptingFailed(String),

    #[error("Invalid format: {0}\n→ Suggestion: Run `termfont refresh` to rebuild the font cache")]
    InvalidFormat(String),

    #[error("Invalid terminal config: {0}\n→ Suggestion: Fix the file by hand or restore it from the .old backup")]
    InvalidConfig(String),
}

/// Result type for termfont operations
pub type FontResult<T> = Result<T, FontError>;

/// A font family paired with one of its styles
///
/// This is also the cache record: each line of the font cache is one `Font`
/// encoded as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Font {
    /// Typeface group, e.g. "Menlo"
    pub family: String,

    /// Variant within the family, e.g. "Bold"
    #[serde(default)]
    pub style: String,
}

impl Font {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }

    /// Build a font from a family and an optional style, falling back to
    /// [`DEFAULT_STYLE`] when the style is missing or blank
    pub fn with_default_style(family: impl Into<String>, style: Option<&str>) -> Self {
        let style = match style.map(str::trim) {
            Some(style) if !style.is_empty() => style.to_string(),
            _ => DEFAULT_STYLE.to_string(),
        };
        Self::new(family, style)
    }

    /// Encode as a single-line JSON record (no trailing newline)
    pub fn to_record(&self) -> FontResult<String> {
        serde_json::to_string(self)
            .map_err(|e| FontError::InvalidFormat(format!("Failed to encode font record: {}", e)))
    }

    /// Decode a single JSON record
    pub fn from_record(line: &str) -> FontResult<Self> {
        let font: Font = serde_json::from_str(line.trim()).map_err(|e| {
            FontError::InvalidFormat(format!("Malformed font record {:?}: {}", line.trim(), e))
        })?;

        if font.family.trim().is_empty() {
            return Err(FontError::InvalidFormat(format!(
                "Font record without a family: {:?}",
                line.trim()
            )));
        }

        Ok(Self::with_default_style(font.family, Some(font.style.as_str())))
    }

    /// Interpret the line a selector printed
    ///
    /// Accepts a JSON record, or a bare family name as written by older
    /// plain-text caches. Trailing whitespace is ignored.
    pub fn from_selection(line: &str) -> FontResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(FontError::SelectionCancelled);
        }

        if line.starts_with('{') {
            return Self::from_record(line);
        }

        log::warn!("Selection {:?} is not a font record, using it as a family name", line);
        Ok(Self::with_default_style(line, None))
    }

    /// Human-readable "Family Style" form
    pub fn display_name(&self) -> String {
        format!("{} {}", self.family, self.style)
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.family, self.style)
    }
}

/// Source of the installed-font report (`system_profiler -json SPFontsDataType` on macOS)
pub trait FontEnumerator: Send + Sync {
    /// Return the raw JSON report
    fn enumerate(&self) -> FontResult<Vec<u8>>;
}

/// Interactive narrowing of a candidate list down to one line
pub trait FontSelector: Send + Sync {
    /// Present newline-delimited `candidates` and return the chosen line
    fn select(&self, candidates: &[u8]) -> FontResult<String>;
}

/// Command channel to the native terminal application
pub trait TerminalScripter: Send + Sync {
    /// Set the font of the terminal's front window
    fn set_font_family(&self, family: &str) -> FontResult<()>;
}

/// Filesystem helpers shared by the cache and config writers
pub mod fs_util {
    use super::FontResult;
    use std::path::Path;

    /// Create `path` and any missing parents, readable only by the owner on Unix
    pub fn create_private_dir_all(path: &Path) -> FontResult<()> {
        if path.as_os_str().is_empty() || path.is_dir() {
            return Ok(());
        }

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder.create(path)?;
        log::debug!("Created directory {}", path.display());
        Ok(())
    }

    /// Create the parent directory of `file`, if it has one
    pub fn create_parent_dir(file: &Path) -> FontResult<()> {
        match file.parent() {
            Some(parent) => create_private_dir_all(parent),
            None => Ok(()),
        }
    }
}
