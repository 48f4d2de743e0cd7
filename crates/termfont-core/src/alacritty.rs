//! Alacritty configuration merge
//!
//! The config file is treated as an ordered TOML document. Only
//! `font.normal.family`, `font.normal.style` and, when the `font` table is
//! created, `font.size` are written; every other section and key is carried
//! through unchanged.

use crate::{fs_util, Font, FontError, FontResult};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Font size written when termfont creates the `font` table
pub const DEFAULT_FONT_SIZE: f64 = 14.0;

/// Parsed Alacritty config document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlacrittyConfig {
    document: Table,
}

impl AlacrittyConfig {
    /// Fresh document holding only a `font` table for `font`
    pub fn with_font(font: &Font) -> Self {
        let mut document = Table::new();
        document.insert("font".to_string(), new_font_table(font));
        Self { document }
    }

    pub fn parse(text: &str) -> FontResult<Self> {
        let document = text
            .parse::<Table>()
            .map_err(|e| FontError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;
        Ok(Self { document })
    }

    /// Serialize without indentation, in document order
    pub fn to_toml_string(&self) -> FontResult<String> {
        toml::to_string(&self.document)
            .map_err(|e| FontError::InvalidConfig(format!("Failed to encode TOML: {}", e)))
    }

    /// Point `font.normal` at `font`.
    ///
    /// An existing `font` table keeps its size and other keys; only the
    /// `normal` sub-table is replaced. A missing `font` table is created with
    /// [`DEFAULT_FONT_SIZE`].
    pub fn set_font(&mut self, font: &Font) -> FontResult<()> {
        match self.document.get_mut("font") {
            Some(Value::Table(section)) => {
                section.insert("normal".to_string(), normal_table(font));
            }
            Some(other) => {
                return Err(FontError::InvalidConfig(format!(
                    "`font` must be a table, found {}",
                    other.type_str()
                )));
            }
            None => {
                self.document
                    .insert("font".to_string(), new_font_table(font));
            }
        }
        Ok(())
    }

    /// The font named by `font.normal`, if any
    pub fn font(&self) -> Option<Font> {
        let normal = self.section("font")?.get("normal")?.as_table()?;
        let family = normal.get("family")?.as_str()?;
        let style = normal.get("style").and_then(Value::as_str);
        Some(Font::with_default_style(family, style))
    }

    pub fn font_size(&self) -> Option<f64> {
        match self.section("font")?.get("size")? {
            Value::Float(size) => Some(*size),
            Value::Integer(size) => Some(*size as f64),
            _ => None,
        }
    }

    /// Top-level table by name
    pub fn section(&self, name: &str) -> Option<&Table> {
        self.document.get(name)?.as_table()
    }

    pub fn document(&self) -> &Table {
        &self.document
    }
}

fn normal_table(font: &Font) -> Value {
    let mut normal = Table::new();
    normal.insert("family".to_string(), Value::String(font.family.clone()));
    normal.insert("style".to_string(), Value::String(font.style.clone()));
    Value::Table(normal)
}

fn new_font_table(font: &Font) -> Value {
    let mut section = Table::new();
    section.insert("size".to_string(), Value::Float(DEFAULT_FONT_SIZE));
    section.insert("normal".to_string(), normal_table(font));
    Value::Table(section)
}

/// What [`apply_font`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No config existed; a new one was written
    Created { path: PathBuf },
    /// The config was rewritten after its previous bytes were saved to `backup`
    Updated { path: PathBuf, backup: PathBuf },
}

/// Sibling backup path: `alacritty.toml` → `alacritty.toml.old`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("alacritty.toml"));
    name.push(".old");
    path.with_file_name(name)
}

fn read_existing(path: &Path) -> FontResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FontError::IoError(e)),
    }
}

fn decode_utf8(path: &Path, bytes: &[u8]) -> FontResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| {
        FontError::InvalidConfig(format!("{} is not valid UTF-8", path.display()))
    })
}

fn merged(path: &Path, bytes: &[u8], font: &Font) -> FontResult<String> {
    let mut config = AlacrittyConfig::parse(&decode_utf8(path, bytes)?)?;
    config.set_font(font)?;
    config.to_toml_string()
}

/// Write `font` into the Alacritty config at `path`.
///
/// An existing file is copied to [`backup_path`] before it is parsed, so the
/// previous state survives even when the merge fails.
pub fn apply_font(path: &Path, font: &Font) -> FontResult<ApplyOutcome> {
    let Some(bytes) = read_existing(path)? else {
        fs_util::create_parent_dir(path)?;
        fs::write(path, AlacrittyConfig::with_font(font).to_toml_string()?)?;
        log::info!("Created {} with font {}", path.display(), font);
        return Ok(ApplyOutcome::Created {
            path: path.to_path_buf(),
        });
    };

    let backup = backup_path(path);
    fs::write(&backup, &bytes)?;
    log::debug!("Backed up {} to {}", path.display(), backup.display());

    let text = merged(path, &bytes, font)?;
    fs::write(path, text)?;
    log::info!("Updated {} with font {}", path.display(), font);

    Ok(ApplyOutcome::Updated {
        path: path.to_path_buf(),
        backup,
    })
}

/// The text [`apply_font`] would write, without touching the filesystem
pub fn preview_font(path: &Path, font: &Font) -> FontResult<String> {
    match read_existing(path)? {
        Some(bytes) => merged(path, &bytes, font),
        None => AlacrittyConfig::with_font(font).to_toml_string(),
    }
}
