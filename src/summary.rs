//! Info grid contents for a selected mod pack or the standalone bucket.

use crate::mod_model::Manifest;
use indexmap::IndexMap;
use std::fmt;

pub const NOT_AVAILABLE: &str = "[ N/A ]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleLabel {
    Enable,
    Disable,
}

impl ToggleLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleLabel::Enable => "Enable",
            ToggleLabel::Disable => "Disable",
        }
    }

    /// Majority vote over the entries, not a per-mod state.
    pub fn for_counts(enabled: usize, disabled: usize) -> Self {
        if enabled > disabled {
            ToggleLabel::Disable
        } else {
            ToggleLabel::Enable
        }
    }

    pub fn for_state(enabled: bool) -> Self {
        if enabled {
            ToggleLabel::Disable
        } else {
            ToggleLabel::Enable
        }
    }
}

impl fmt::Display for ToggleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPackSummary {
    pub title: String,
    pub author: String,
    pub version: String,
    pub mod_count: usize,
    pub enabled: usize,
    pub disabled: usize,
    /// `"[count] name\n"` per distinct mod name, in first-seen order.
    pub contents: String,
    pub toggle: ToggleLabel,
}

/// Summarizes the pack `pack`, or the standalone mods when it is `None`.
pub fn summarize(manifest: &Manifest, title: &str, pack: Option<&str>) -> ModPackSummary {
    let (author, version) = match pack.and_then(|name| manifest.mod_pack(name)) {
        Some(declared) => (declared.author.clone(), declared.version.clone()),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    let mut enabled = 0;
    let mut disabled = 0;
    let mut tally: IndexMap<&str, usize> = IndexMap::new();

    for entry in manifest.mods_in_pack(pack) {
        if entry.enabled {
            enabled += 1;
        } else {
            disabled += 1;
        }
        *tally.entry(entry.name.as_str()).or_default() += 1;
    }

    let contents = tally
        .iter()
        .map(|(name, count)| format!("[{count}] {name}\n"))
        .collect();

    ModPackSummary {
        title: title.to_string(),
        author,
        version,
        mod_count: enabled + disabled,
        enabled,
        disabled,
        contents,
        toggle: ToggleLabel::for_counts(enabled, disabled),
    }
}
