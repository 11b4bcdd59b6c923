//! Dataset naming and library path resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Library holding unqualified dataset names.
pub const WORK_LIBRARY: &str = "work";

/// File extension of engine-native datasets.
pub const DATASET_EXTENSION: &str = "sas7bdat";

/// Dataset naming error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name of SAS datasets can only be name or libname.name: {0} specified")]
    TooManyQualifiers(String),
    #[error("Empty dataset name: {0:?}")]
    Empty(String),
}

/// A dataset requested for import, `table` or `library.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeItem {
    /// Name as requested by the user.
    pub name: String,
    /// Library reference, `work` when unqualified.
    pub library: String,
    /// Dataset name within the library.
    pub table: String,
}

impl ExchangeItem {
    /// Parse a requested item name.
    ///
    /// # Errors
    /// Returns error if the name has more than one `.` or an empty part.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let (library, table) = match name.split_once('.') {
            Some((_, rest)) if rest.contains('.') => {
                return Err(NameError::TooManyQualifiers(name.to_string()));
            }
            Some((library, table)) => (library, table),
            None => (WORK_LIBRARY, name),
        };
        if library.is_empty() || table.is_empty() {
            return Err(NameError::Empty(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            library: library.to_string(),
            table: table.to_string(),
        })
    }

    /// Key under which the imported table is returned to the host.
    #[must_use]
    pub fn result_key(&self) -> String {
        self.name.replace('.', "_")
    }

    /// Statement that makes SAS print the library path after `marker=`.
    #[must_use]
    pub fn path_probe(&self, marker: &str) -> String {
        format!("%put {marker}=%sysfunc(pathname({}));\n", self.library)
    }

    /// Dataset file inside a resolved library directory.
    #[must_use]
    pub fn data_file(&self, library_path: &Path) -> PathBuf {
        library_path.join(format!("{}.{DATASET_EXTENSION}", self.table.to_lowercase()))
    }
}

impl fmt::Display for ExchangeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Extract the library paths printed after `marker=` in `text`.
///
/// A concatenated library prints as `('/a' '/b' '/c')`; its paths come back
/// last-declared first. An absent marker yields no paths. The echo of the
/// probe statement itself (`marker=%sysfunc(...)`) is not a value.
#[must_use]
pub fn resolve_library_paths(text: &str, marker: &str) -> Vec<String> {
    let needle = format!("{marker}=");
    let Some(after) = text
        .match_indices(&needle)
        .map(|(start, _)| &text[start + needle.len()..])
        .find(|after| !after.starts_with("%sysfunc"))
    else {
        return Vec::new();
    };
    let raw = after
        .split(['<', '\n', '\r'])
        .next()
        .unwrap_or_default()
        .trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if !raw.starts_with('(') {
        return vec![raw.to_string()];
    }

    // The list may span lines, so rescan from the full text.
    let list = &after.trim_start()[1..];
    let list = list.split(')').next().unwrap_or_default();
    let mut paths = quoted_entries(list);
    paths.reverse();
    paths
}

/// Entries enclosed in single or double quotes, in order.
fn quoted_entries(list: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut rest = list;
    while let Some(open) = rest.find(['\'', '"']) {
        let quote = rest[open..].chars().next().unwrap_or('\'');
        let body = &rest[open + 1..];
        let Some(close) = body.find(quote) else {
            break;
        };
        let entry = &body[..close];
        if !entry.is_empty() {
            entries.push(entry.to_string());
        }
        rest = &body[close + 1..];
    }
    entries
}
