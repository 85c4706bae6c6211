use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::check::{check_table, CheckReport};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::extractor::{extract_from_file, KeyExtractor, KeyScanner};
use crate::fs::FileSystem;
use crate::logging;
use crate::scan::{self, SourceFile};
use crate::store::{self, LoadedTable, SaveOutcome};
use crate::strings_file;
use crate::table::{is_reserved_key, TranslationTable};

/// Per-run switches that are not part of the persistent configuration
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Scan every file regardless of modification time
    pub force_rescan: bool,
    /// Remove keys not seen during a full rescan
    pub clean: bool,
    /// Explicit language columns, replacing the table's own list
    pub languages: Option<Vec<String>>,
    /// Do everything except writing the table
    pub dry_run: bool,
}

/// Result of one extract or convert run
#[derive(Debug)]
pub struct SyncReport {
    pub table_path: PathBuf,
    pub languages: Vec<String>,
    pub files_scanned: usize,
    pub files_unchanged: usize,
    /// Keys inserted during this run, ascending
    pub added_keys: Vec<String>,
    /// Keys dropped by clean mode, ascending
    pub removed_keys: Vec<String>,
    /// Resource entries written into the table (convert mode)
    pub translations_imported: usize,
    pub total_keys: usize,
    pub check: CheckReport,
    pub save: SaveOutcome,
    /// Load and scan diagnostics; consistency findings live in `check`
    pub diagnostics: Diagnostics,
}

/// Keys discovered in a set of source files
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub added_keys: Vec<String>,
    pub observed: HashSet<String>,
    pub files_scanned: usize,
}

/// Extract keys from `files` into `table`, never touching existing rows.
///
/// Unreadable files are reported and skipped.
pub fn scan_sources<S, F>(
    table: &mut TranslationTable,
    files: &[PathBuf],
    scanner: &S,
    fs: &F,
    diagnostics: &mut Diagnostics,
) -> ScanOutcome
where
    S: KeyScanner + ?Sized,
    F: FileSystem,
{
    let mut outcome = ScanOutcome::default();

    for path in files {
        logging::debug(&format!("Processing {}", path.display()));
        let keys = match extract_from_file(path, scanner, fs) {
            Ok(keys) => keys,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    path.display().to_string(),
                    None,
                    format!("{:#}", e),
                ));
                continue;
            }
        };
        outcome.files_scanned += 1;
        if !keys.is_empty() {
            logging::debug(&format!("Parsed {} keys.", keys.len()));
        }

        for key in keys {
            if is_reserved_key(&key) {
                diagnostics.push(Diagnostic::warning(
                    path.display().to_string(),
                    None,
                    format!("Key '{}' is reserved for the language row; skipped", key),
                ));
                continue;
            }
            if table.insert_key(&key) {
                outcome.added_keys.push(key.clone());
            }
            outcome.observed.insert(key);
        }
    }

    outcome.added_keys.sort();
    outcome
}

/// Merge every resource file into its language column.
///
/// Files whose directory language is not a column of `table` are skipped.
/// Returns the number of accepted entries.
pub fn import_resources<F: FileSystem>(
    table: &mut TranslationTable,
    files: &[scan::ResourceFile],
    fs: &F,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut imported = 0;

    for file in files {
        let Some(index) = table.language_index(&file.language) else {
            logging::debug(&format!(
                "Skipping {}: language '{}' is not in the table",
                file.path.display(),
                file.language
            ));
            continue;
        };

        logging::debug(&format!("Processing {}", file.path.display()));
        match strings_file::merge_strings_file(table, &file.path, index, fs) {
            Ok(merge) => {
                logging::debug(&format!(
                    "Parsed {} translations from {}",
                    merge.accepted,
                    file.path.display()
                ));
                for key in merge.reserved {
                    diagnostics.push(Diagnostic::warning(
                        file.path.display().to_string(),
                        None,
                        format!("Key '{}' is reserved for the language row; skipped", key),
                    ));
                }
                imported += merge.accepted;
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                file.path.display().to_string(),
                None,
                format!("{:#}", e),
            )),
        }
    }

    imported
}

fn load(table_path: &Path, fs: &impl FileSystem) -> LoadedTable {
    let loaded = store::load_table(table_path, fs);
    if loaded.existed && !loaded.unreadable {
        let ending = if loaded.table.len() == 1 { "" } else { "s" };
        logging::debug(&format!(
            "Loaded {} key{} from {}",
            loaded.table.len(),
            ending,
            table_path.display()
        ));
    }
    loaded
}

fn finish<F: FileSystem>(
    table_path: &Path,
    loaded: LoadedTable,
    table: TranslationTable,
    dry_run: bool,
    fs: &F,
) -> Result<(CheckReport, SaveOutcome, Diagnostics, TranslationTable)> {
    let display = table_path.display().to_string();
    let check = check_table(&table, &display);
    let save = if loaded.unreadable {
        SaveOutcome::Skipped
    } else {
        store::save_table(table_path, &table, loaded.original.as_deref(), dry_run, fs)?
    };
    match save {
        SaveOutcome::Written => logging::debug(&format!("Saved {}", display)),
        SaveOutcome::Unchanged => logging::debug(&format!("{} is up to date", display)),
        SaveOutcome::DryRun => logging::debug(&format!("Dry run: {} not written", display)),
        SaveOutcome::Skipped => logging::debug(&format!("{} left untouched", display)),
    }
    Ok((check, save, loaded.diagnostics, table))
}

/// Scan sources under `source_root` and merge their keys into the table at
/// `table_path`.
pub fn run_extract<F: FileSystem>(
    config: &Config,
    source_root: &Path,
    table_path: &Path,
    options: &SyncOptions,
    fs: &F,
) -> Result<SyncReport> {
    let extractor = KeyExtractor::new(&config.function)?;
    let ignore = scan::compile_ignore_patterns(&config.ignore)?;
    // Clean mode implies a full rescan.
    let full_rescan = options.force_rescan || options.clean;

    let mut loaded = load(table_path, fs);
    let mut table = std::mem::take(&mut loaded.table);
    match &options.languages {
        Some(languages) => table.set_languages(languages.clone()),
        None if !loaded.existed => table.set_languages(config.languages.clone()),
        None => {}
    }

    let selection = scan::select_changed(
        scan::source_files(source_root, &config.extensions, &ignore),
        loaded.modified,
        full_rescan,
    );
    for file in &selection.unchanged {
        logging::debug(&format!("File {} was not modified.", file.path.display()));
    }
    let paths: Vec<PathBuf> = selection
        .changed
        .into_iter()
        .map(|SourceFile { path, .. }| path)
        .collect();

    let mut diagnostics = Diagnostics::new();
    let scanned = scan_sources(&mut table, &paths, &extractor, fs, &mut diagnostics);

    let unreadable = paths.len() - scanned.files_scanned;
    let removed_keys = if options.clean && unreadable > 0 {
        diagnostics.push(Diagnostic::warning(
            table_path.display().to_string(),
            None,
            format!(
                "Not removing unused keys: {} source file(s) could not be read",
                unreadable
            ),
        ));
        Vec::new()
    } else if options.clean {
        table.retain_keys(&scanned.observed)
    } else {
        Vec::new()
    };

    let (check, save, load_diagnostics, table) =
        finish(table_path, loaded, table, options.dry_run, fs)?;
    let mut all = load_diagnostics;
    all.extend(diagnostics);

    Ok(SyncReport {
        table_path: table_path.to_path_buf(),
        languages: table.languages().to_vec(),
        files_scanned: scanned.files_scanned,
        files_unchanged: selection.unchanged.len(),
        added_keys: scanned.added_keys,
        removed_keys,
        translations_imported: 0,
        total_keys: table.len(),
        check,
        save,
        diagnostics: all,
    })
}

/// Import legacy resource directories under `source_root` into the table at
/// `table_path`.
pub fn run_convert<F: FileSystem>(
    config: &Config,
    source_root: &Path,
    table_path: &Path,
    options: &SyncOptions,
    fs: &F,
) -> Result<SyncReport> {
    let ignore = scan::compile_ignore_patterns(&config.ignore)?;

    let mut loaded = load(table_path, fs);
    let mut table = std::mem::take(&mut loaded.table);

    // The language list must be final before any file is parsed.
    match &options.languages {
        Some(languages) => table.set_languages(languages.clone()),
        None => {
            let discovered = scan::resource_languages(
                source_root,
                &config.resource_dir_suffix,
                &config.default_language,
            );
            let added = table.add_languages(discovered);
            if !added.is_empty() {
                logging::debug(&format!("Discovered languages: {}", added.join(", ")));
            }
        }
    }

    let files = scan::resource_files(
        source_root,
        &config.resource_dir_suffix,
        &config.resource_extension,
        &ignore,
    );
    let keys_before: HashSet<String> = table.rows().map(|(k, _)| k.to_string()).collect();

    let mut diagnostics = Diagnostics::new();
    let imported = import_resources(&mut table, &files, fs, &mut diagnostics);

    let added_keys: Vec<String> = table
        .rows()
        .map(|(k, _)| k)
        .filter(|k| !keys_before.contains(*k))
        .map(|k| k.to_string())
        .collect();

    let (check, save, load_diagnostics, table) =
        finish(table_path, loaded, table, options.dry_run, fs)?;
    let mut all = load_diagnostics;
    all.extend(diagnostics);

    Ok(SyncReport {
        table_path: table_path.to_path_buf(),
        languages: table.languages().to_vec(),
        files_scanned: files.len(),
        files_unchanged: 0,
        added_keys,
        removed_keys: Vec::new(),
        translations_imported: imported,
        total_keys: table.len(),
        check,
        save,
        diagnostics: all,
    })
}

/// Load the table and run only the consistency check
pub fn run_check<F: FileSystem>(table_path: &Path, fs: &F) -> Result<(CheckReport, Diagnostics)> {
    let loaded = load(table_path, fs);
    if !loaded.existed {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning(
            table_path.display().to_string(),
            None,
            "Translation table does not exist; nothing to check",
        ));
        return Ok((CheckReport::default(), diagnostics));
    }
    let check = check_table(&loaded.table, &table_path.display().to_string());
    Ok((check, loaded.diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::InMemoryFileSystem;

    #[test]
    fn test_scan_sources_inserts_only_new_keys() {
        let fs = InMemoryFileSystem::new();
        fs.add_file(
            "src/A.m",
            r#"Localize(@"greeting"); Localize(@"goodbye");"#,
        );
        let mut table = TranslationTable::with_languages(vec!["en".into(), "ru".into()]);
        table.insert_row("greeting".into(), vec!["Hello".into(), "Привет".into()]);

        let extractor = KeyExtractor::new("Localize").unwrap();
        let mut diagnostics = Diagnostics::new();
        let outcome = scan_sources(
            &mut table,
            &[PathBuf::from("src/A.m")],
            &extractor,
            &fs,
            &mut diagnostics,
        );

        assert_eq!(outcome.added_keys, vec!["goodbye".to_string()]);
        assert_eq!(outcome.observed.len(), 2);
        assert_eq!(table.get("greeting").unwrap(), ["Hello", "Привет"]);
        assert_eq!(table.get("goodbye").unwrap(), ["", ""]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_scan_sources_reports_unreadable_file_and_continues() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("src/B.m", r#"Localize(@"ok");"#);
        let mut table = TranslationTable::with_languages(vec!["en".into()]);
        let extractor = KeyExtractor::new("Localize").unwrap();
        let mut diagnostics = Diagnostics::new();

        let outcome = scan_sources(
            &mut table,
            &[PathBuf::from("src/Gone.m"), PathBuf::from("src/B.m")],
            &extractor,
            &fs,
            &mut diagnostics,
        );

        assert_eq!(outcome.files_scanned, 1);
        assert!(table.contains_key("ok"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics
            .iter()
            .next()
            .unwrap()
            .to_string()
            .starts_with("src/Gone.m: error: Failed to read file"));
    }

    #[test]
    fn test_scan_sources_skips_reserved_key() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("src/C.m", r#"Localize(@"language");"#);
        let mut table = TranslationTable::with_languages(vec!["en".into()]);
        let extractor = KeyExtractor::new("Localize").unwrap();
        let mut diagnostics = Diagnostics::new();

        scan_sources(
            &mut table,
            &[PathBuf::from("src/C.m")],
            &extractor,
            &fs,
            &mut diagnostics,
        );

        assert!(table.is_empty());
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_import_resources_skips_unknown_language() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("en.lproj/L.strings", r#""title" = "Title";"#);
        fs.add_file("de.lproj/L.strings", r#""title" = "Titel";"#);
        let mut table = TranslationTable::with_languages(vec!["en".into()]);
        let files = vec![
            scan::ResourceFile {
                path: PathBuf::from("de.lproj/L.strings"),
                language: "de".into(),
            },
            scan::ResourceFile {
                path: PathBuf::from("en.lproj/L.strings"),
                language: "en".into(),
            },
        ];
        let mut diagnostics = Diagnostics::new();

        let imported = import_resources(&mut table, &files, &fs, &mut diagnostics);

        assert_eq!(imported, 1);
        assert_eq!(table.get("title").unwrap(), ["Title"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_import_resources_reports_undecodable_file_and_continues() {
        let fs = InMemoryFileSystem::new();
        // UTF-16 LE byte order mark followed by an odd number of bytes
        fs.add_file("ru.lproj/L.strings", vec![0xff, 0xfe, 0x41]);
        fs.add_file("en.lproj/L.strings", r#""title" = "Title";"#);
        let mut table = TranslationTable::with_languages(vec!["en".into(), "ru".into()]);
        let files = vec![
            scan::ResourceFile {
                path: PathBuf::from("ru.lproj/L.strings"),
                language: "ru".into(),
            },
            scan::ResourceFile {
                path: PathBuf::from("ru.lproj/Gone.strings"),
                language: "ru".into(),
            },
            scan::ResourceFile {
                path: PathBuf::from("en.lproj/L.strings"),
                language: "en".into(),
            },
        ];
        let mut diagnostics = Diagnostics::new();

        let imported = import_resources(&mut table, &files, &fs, &mut diagnostics);

        assert_eq!(imported, 1);
        assert_eq!(table.get("title").unwrap(), ["Title", ""]);
        let messages: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("ru.lproj/L.strings: error: Failed to decode file"));
        assert!(messages[1].starts_with("ru.lproj/Gone.strings: error: Failed to read file"));
    }

    #[test]
    fn test_clean_keeps_keys_when_a_source_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("A.m"), r#"Localize(@"used");"#).unwrap();
        std::fs::write(src.join("Bad.m"), b"\xffLocalize(@\"hidden\");").unwrap();
        let table_path = tmp.path().join("Localization.csv");
        let content = "language,en\nstale,Old\nused,Used\n";
        std::fs::write(&table_path, content).unwrap();

        let options = SyncOptions {
            clean: true,
            ..SyncOptions::default()
        };
        let report = run_extract(
            &Config::default(),
            &src,
            &table_path,
            &options,
            &crate::fs::RealFileSystem,
        )
        .unwrap();

        assert!(report.removed_keys.is_empty());
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.save, SaveOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(&table_path).unwrap(), content);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message.starts_with("Not removing unused keys: 1 source file(s)")));
    }

    #[test]
    fn test_run_extract_with_unreadable_table_scans_but_does_not_save() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("A.m"), r#"Localize(@"greeting");"#).unwrap();
        let table_path = tmp.path().join("Localization.csv");
        let bytes = b"language,en\ngreeting,\xff\n".to_vec();
        std::fs::write(&table_path, &bytes).unwrap();

        let options = SyncOptions {
            force_rescan: true,
            ..SyncOptions::default()
        };
        let report = run_extract(
            &Config::default(),
            &src,
            &table_path,
            &options,
            &crate::fs::RealFileSystem,
        )
        .unwrap();

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.added_keys, vec!["greeting".to_string()]);
        assert_eq!(report.save, SaveOutcome::Skipped);
        assert_eq!(std::fs::read(&table_path).unwrap(), bytes);
        let errors: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.severity == crate::diagnostics::Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("will not be overwritten"));
    }

    #[test]
    fn test_run_check_reports_unreadable_table() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("Localization.csv", vec![0xff, 0xfe, 0x41]);

        let (check, diagnostics) = run_check(Path::new("Localization.csv"), &fs).unwrap();

        assert!(check.is_clean());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_run_check_without_table() {
        let fs = InMemoryFileSystem::new();
        let (check, diagnostics) = run_check(Path::new("Localization.csv"), &fs).unwrap();
        assert!(check.is_clean());
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_run_check_reports_missing_translations() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("Localization.csv", "language,en,ru\ngoodbye,,\ngreeting,Hello,Привет\n");

        let (check, diagnostics) = run_check(Path::new("Localization.csv"), &fs).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(check.incomplete_keys, 1);
        assert_eq!(
            check.diagnostics.iter().next().unwrap().to_string(),
            "Localization.csv:2: warning: Missing translations for key 'goodbye' for languages: en, ru"
        );
    }
}
