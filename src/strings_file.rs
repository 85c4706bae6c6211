use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::comments::strip_comments;
use crate::fs::FileSystem;
use crate::table::{is_reserved_key, TranslationTable};
use crate::text::{decode, unescape};

static STRINGS_ENTRY_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_strings_entry_regex() -> &'static Regex {
    STRINGS_ENTRY_REGEX.get_or_init(|| {
        Regex::new(r#"(?s)"((?:\\.|[^"\\])*)"\s*=\s*"((?:\\.|[^"\\])*)"\s*;"#)
            .expect("STRINGS_ENTRY_REGEX pattern is invalid - this is a bug")
    })
}

/// One accepted `"key" = "value";` entry, already un-escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringsEntry {
    pub key: String,
    pub value: String,
}

/// Counts from merging one resource file into the table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringsMerge {
    /// Entries written into the table
    pub accepted: usize,
    /// Entries whose key collides with the reserved language key
    pub reserved: Vec<String>,
}

/// Parse comment-free resource text.
///
/// Entries whose key or value is empty after un-escaping are dropped.
pub fn parse_entries(text: &str) -> Vec<StringsEntry> {
    get_strings_entry_regex()
        .captures_iter(text)
        .filter_map(|captures| {
            let key = unescape(captures.get(1)?.as_str()).into_owned();
            let value = unescape(captures.get(2)?.as_str()).into_owned();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some(StringsEntry { key, value })
        })
        .collect()
}

/// Strip comments from raw resource text, parse it, and write every entry
/// into the column `language_index`.
pub fn merge_strings(
    table: &mut TranslationTable,
    source: &str,
    language_index: usize,
) -> StringsMerge {
    let mut merge = StringsMerge::default();
    for entry in parse_entries(&strip_comments(source)) {
        if is_reserved_key(&entry.key) {
            merge.reserved.push(entry.key);
            continue;
        }
        table.set_translation(&entry.key, language_index, &entry.value);
        merge.accepted += 1;
    }
    merge
}

/// Read, decode and merge one resource file
pub fn merge_strings_file<F: FileSystem>(
    table: &mut TranslationTable,
    path: &Path,
    language_index: usize,
    fs: &F,
) -> Result<StringsMerge> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let source =
        decode(&bytes).with_context(|| format!("Failed to decode file: {}", path.display()))?;
    Ok(merge_strings(table, &source, language_index))
}

/// Language named by a resource directory: `en.lproj` → `en` for suffix `lproj`
pub fn language_for_dir<'a>(dir_name: &'a str, suffix: &str) -> Option<&'a str> {
    let stem = dir_name.strip_suffix(suffix)?.strip_suffix('.')?;
    (!stem.is_empty()).then_some(stem)
}
