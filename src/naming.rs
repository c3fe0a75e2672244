//! Display names for tables and columns.
//!
//! Spreadsheet sheet names are limited to 31 characters, while flattened
//! table paths grow with every level of nesting. Table names are therefore
//! either replaced by a registered label or compressed with
//! [`create_short_name`]. Columns with a registered code get their full
//! label prepended.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Maximum length of a worksheet name.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const BUILTIN_REGISTRY: &str = include_str!("../resources/naming_registry.json");

/// Represents errors that can occur while loading a naming registry.
#[derive(Error, Debug)]
pub enum NamingError {
    #[error("failed to read naming registry {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid naming registry: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compresses a dotted path name so that it fits in a worksheet name.
///
/// Names of at most 31 characters are returned unchanged. Longer names keep
/// the first two and the last character of every segment but the last one,
/// followed by the last segment in full. When that is still too long, the
/// first 30 characters are kept and the final character is appended.
///
/// Different inputs may shorten to the same name.
pub fn create_short_name(name: &str) -> String {
    if name.chars().count() <= MAX_SHEET_NAME_LEN {
        return name.to_string();
    }

    let segments: Vec<&str> = name.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(parts) => parts,
        None => return name.to_string(),
    };

    let mut short_name = String::new();
    for segment in parents {
        let chars: Vec<char> = segment.chars().collect();
        short_name.extend(chars.iter().take(2));
        if let Some(c) = chars.last() {
            short_name.push(*c);
        }
        short_name.push('.');
    }
    short_name.push_str(last);

    let chars: Vec<char> = short_name.chars().collect();
    if chars.len() <= MAX_SHEET_NAME_LEN {
        return short_name;
    }
    let mut truncated: String = chars[..MAX_SHEET_NAME_LEN - 1].iter().collect();
    truncated.push(chars[chars.len() - 1]);
    truncated
}

/// Full labels for known column codes and table paths.
///
/// Both namespaces match exact keys only. The registry is loaded once and
/// never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingRegistry {
    columns: HashMap<String, String>,
    tables: HashMap<String, String>,
}

impl NamingRegistry {
    pub fn new(columns: HashMap<String, String>, tables: HashMap<String, String>) -> Self {
        NamingRegistry { columns, tables }
    }

    /// The registry bundled with the binary.
    pub fn builtin() -> Result<Self, NamingError> {
        Self::from_json_str(BUILTIN_REGISTRY)
    }

    /// Parses a registry of the form `{"columns": {...}, "tables": {...}}`.
    /// Either map may be omitted.
    pub fn from_json_str(input: &str) -> Result<Self, NamingError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NamingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| NamingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_json_str(&content)?;
        log::debug!(
            "loaded naming registry {} ({} columns, {} tables)",
            path.display(),
            registry.columns.len(),
            registry.tables.len()
        );
        Ok(registry)
    }

    pub fn column_label(&self, code: &str) -> Option<&str> {
        self.columns.get(code).map(String::as_str)
    }

    pub fn table_label(&self, path: &str) -> Option<&str> {
        self.tables.get(path).map(String::as_str)
    }

    /// `"<label> (<code>)"` for a registered code, otherwise the code itself.
    pub fn column_display_name(&self, code: &str) -> String {
        match self.column_label(code) {
            Some(label) => format!("{} ({})", label, code),
            None => code.to_string(),
        }
    }

    /// The registered label of a table path, otherwise its short name.
    pub fn table_display_name(&self, path: &str) -> String {
        match self.table_label(path) {
            Some(label) => label.to_string(),
            None => create_short_name(path),
        }
    }
}
