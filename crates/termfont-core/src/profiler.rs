//! Decoding of the macOS font report
//!
//! `system_profiler -json SPFontsDataType` prints one entry per font file,
//! each listing the typefaces it contains. Only family and style matter here.

use crate::{Font, FontError, FontResult, DEFAULT_STYLE};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Top-level report object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilerReport {
    #[serde(rename = "SPFontsDataType", default)]
    pub entries: Vec<FontFileEntry>,
}

/// One font file as reported by the profiler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontFileEntry {
    #[serde(default)]
    pub typefaces: Vec<Typeface>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Typeface {
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub style: String,
}

/// Decode the raw JSON report
pub fn decode(bytes: &[u8]) -> FontResult<ProfilerReport> {
    serde_json::from_slice(bytes).map_err(|e| {
        FontError::InvalidFormat(format!("Failed to decode SPFontsDataType report: {}", e))
    })
}

impl ProfilerReport {
    /// Group styles by family; duplicates collapse
    pub fn families(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut families: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for typeface in self.entries.iter().flat_map(|entry| &entry.typefaces) {
            let family = typeface.family.trim();
            if family.is_empty() {
                log::debug!("Skipping typeface without a family (style {:?})", typeface.style);
                continue;
            }

            let style = match typeface.style.trim() {
                "" => DEFAULT_STYLE,
                style => style,
            };

            families
                .entry(family.to_string())
                .or_default()
                .insert(style.to_string());
        }

        families
    }

    /// Distinct (family, style) pairs, ordered by family then style
    pub fn fonts(&self) -> Vec<Font> {
        self.families()
            .into_iter()
            .flat_map(|(family, styles)| {
                styles
                    .into_iter()
                    .map(move |style| Font::new(family.clone(), style))
            })
            .collect()
    }
}
