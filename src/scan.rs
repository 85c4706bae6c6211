use anyhow::{Context, Result};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::strings_file::language_for_dir;

/// A candidate source file with its modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

/// Source files split by whether they need rescanning
#[derive(Debug, Default)]
pub struct SourceSelection {
    pub changed: Vec<SourceFile>,
    pub unchanged: Vec<SourceFile>,
}

/// A legacy resource file and the language its directory names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub language: String,
}

pub fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).with_context(|| format!("Invalid ignore pattern: {}", pattern))
        })
        .collect()
}

fn matches_ignore_path(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed == ext))
        .unwrap_or(false)
}

/// Walk `root` for files whose extension is in `extensions`, sorted by path.
///
/// Entries that cannot be read while walking are skipped.
pub fn source_files(root: &Path, extensions: &[String], ignore: &[Pattern]) -> Vec<SourceFile> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_extension(entry.path(), extensions))
        .filter(|entry| !matches_ignore_path(entry.path(), ignore))
        .map(|entry| SourceFile {
            modified: entry.metadata().ok().and_then(|m| m.modified().ok()),
            path: entry.into_path(),
        })
        .collect()
}

/// Keep files modified strictly after `since`; everything when `since` is
/// unknown or `full_rescan` is set.
pub fn select_changed(
    files: Vec<SourceFile>,
    since: Option<SystemTime>,
    full_rescan: bool,
) -> SourceSelection {
    let mut selection = SourceSelection::default();
    for file in files {
        let changed = match (full_rescan, since, file.modified) {
            (true, _, _) | (_, None, _) | (_, _, None) => true,
            (false, Some(since), Some(modified)) => modified > since,
        };
        if changed {
            selection.changed.push(file);
        } else {
            selection.unchanged.push(file);
        }
    }
    selection
}

/// Languages named by resource directories under `root`, the default
/// language first and the rest in ascending order.
pub fn resource_languages(root: &Path, suffix: &str, default_language: &str) -> Vec<String> {
    let found: BTreeSet<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| language_for_dir(name, suffix))
                .map(|language| language.to_string())
        })
        .collect();

    let mut languages = Vec::with_capacity(found.len());
    if found.contains(default_language) {
        languages.push(default_language.to_string());
    }
    languages.extend(found.into_iter().filter(|l| l != default_language));
    languages
}

/// Resource files under `root` paired with the language of the nearest
/// enclosing resource directory. Files outside any resource directory are
/// not returned.
pub fn resource_files(
    root: &Path,
    suffix: &str,
    extension: &str,
    ignore: &[Pattern],
) -> Vec<ResourceFile> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some(extension))
        .filter(|entry| !matches_ignore_path(entry.path(), ignore))
        .filter_map(|entry| {
            let language = enclosing_language(entry.path(), root, suffix)?;
            Some(ResourceFile {
                path: entry.into_path(),
                language,
            })
        })
        .collect()
}

fn enclosing_language(path: &Path, root: &Path, suffix: &str) -> Option<String> {
    path.ancestors()
        .skip(1)
        .take_while(|dir| dir.starts_with(root))
        .find_map(|dir| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| language_for_dir(name, suffix))
                .map(|language| language.to_string())
        })
}
