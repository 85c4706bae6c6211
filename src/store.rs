use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::fs::FileSystem;
use crate::table::{TranslationTable, LANGUAGE_KEY};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to serialize translation table: {0}")]
    Serialize(#[from] csv::Error),
}

/// A table as found on disk, plus what is needed to save it back.
#[derive(Debug, Default)]
pub struct LoadedTable {
    pub table: TranslationTable,
    /// Whether the file existed at all (false on first run)
    pub existed: bool,
    /// The file exists but could not be read or decoded; it must not be
    /// overwritten
    pub unreadable: bool,
    /// Modification time of the file when it was loaded
    pub modified: Option<SystemTime>,
    /// Raw text as loaded, used to skip no-op saves
    pub original: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Result of a save attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Unchanged,
    DryRun,
    /// The existing file could not be read, so it was left alone
    Skipped,
}

/// Read the persisted table at `path`.
///
/// A missing file yields an empty table. A file without a language row is
/// reported and loaded with an empty language list. Malformed records are
/// reported and skipped. A file that cannot be read or decoded is reported,
/// loaded as an empty table and flagged as `unreadable`.
pub fn load_table<F: FileSystem>(path: &Path, fs: &F) -> LoadedTable {
    if !fs.exists(path) {
        return LoadedTable::default();
    }

    let display = path.display().to_string();
    let content = match fs.read(path).and_then(|bytes| crate::text::decode(&bytes)) {
        Ok(content) => content,
        Err(e) => {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(Diagnostic::error(
                display,
                None,
                format!(
                    "Failed to read translation table ({:#}); it will not be overwritten",
                    e
                ),
            ));
            return LoadedTable {
                existed: true,
                unreadable: true,
                diagnostics,
                ..LoadedTable::default()
            };
        }
    };

    let mut loaded = parse_table(&content, &display);
    loaded.existed = true;
    loaded.modified = fs.modified(path);
    loaded.original = Some(content);
    loaded
}

/// Parse table text. `source_name` is only used in diagnostics.
pub fn parse_table(content: &str, source_name: &str) -> LoadedTable {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    let mut languages: Option<Vec<String>> = None;
    let mut diagnostics = Diagnostics::new();
    let mut first_seen: HashMap<String, u64> = HashMap::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize);
                diagnostics.push(Diagnostic::error(
                    source_name,
                    line,
                    format!("Skipping malformed record: {}", e),
                ));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let mut cells = record.iter().map(|cell| cell.to_string());
        let Some(key) = cells.next() else {
            continue;
        };
        let values: Vec<String> = cells.collect();

        if key == LANGUAGE_KEY {
            if languages.is_some() {
                diagnostics.push(Diagnostic::warning(
                    source_name,
                    Some(line as usize),
                    format!("Duplicate '{}' line ignored.", LANGUAGE_KEY),
                ));
            } else {
                languages = Some(values);
            }
            continue;
        }

        if let Some(previous) = first_seen.get(&key) {
            diagnostics.push(Diagnostic::warning(
                source_name,
                Some(line as usize),
                format!(
                    "Key '{}' already defined on line {}; the later row wins",
                    key, previous
                ),
            ));
        } else {
            first_seen.insert(key.clone(), line);
        }
        rows.push((key, values));
    }

    if languages.is_none() {
        diagnostics.push(Diagnostic::error(
            source_name,
            Some(1),
            format!("Missing line with '{}' key.", LANGUAGE_KEY),
        ));
    }

    let mut table = TranslationTable::with_languages(languages.unwrap_or_default());
    for (key, values) in rows {
        table.insert_row(key, values);
    }

    LoadedTable {
        table,
        diagnostics,
        ..LoadedTable::default()
    }
}

/// Serialize the table: language row first, then keys ascending.
///
/// Rows shorter than the language list are padded with empty cells; cells
/// beyond it are written unchanged.
pub fn render_table(table: &TranslationTable) -> Result<String, TableError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let width = table.languages().len();

    let mut header = Vec::with_capacity(width + 1);
    header.push(LANGUAGE_KEY);
    header.extend(table.languages().iter().map(|l| l.as_str()));
    writer.write_record(&header)?;

    for (key, values) in table.rows() {
        let mut record: Vec<&str> = Vec::with_capacity(values.len().max(width) + 1);
        record.push(key);
        record.extend(values.iter().map(|v| v.as_str()));
        while record.len() < width + 1 {
            record.push("");
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::Serialize(csv::Error::from(e.into_error())))?;
    // Every cell came from a `String`, so the output is valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the table to `path`, replacing the previous file atomically.
///
/// Nothing is written when the rendered text equals `previous` or when
/// `dry_run` is set.
pub fn save_table<F: FileSystem>(
    path: &Path,
    table: &TranslationTable,
    previous: Option<&str>,
    dry_run: bool,
    fs: &F,
) -> Result<SaveOutcome> {
    let rendered = render_table(table)?;

    if previous == Some(rendered.as_str()) {
        return Ok(SaveOutcome::Unchanged);
    }
    if dry_run {
        return Ok(SaveOutcome::DryRun);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs.create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    fs.write_atomic(path, &rendered)
        .with_context(|| format!("Failed to write translation table: {}", path.display()))?;
    Ok(SaveOutcome::Written)
}
