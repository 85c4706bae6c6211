use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::table::TranslationTable;

/// Outcome of checking a table for incomplete translations
#[derive(Debug, Default)]
pub struct CheckReport {
    pub keys_checked: usize,
    /// Keys whose row length differs from the language count
    pub mismatched_keys: usize,
    /// Keys with at least one empty translation
    pub incomplete_keys: usize,
    pub diagnostics: Diagnostics,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Check every key against the table's language list.
///
/// Diagnostics follow persisted row order and carry the line the key's row
/// starts on in the saved file, counting lines inside quoted cells.
/// `table_path` only names the file in diagnostics; the table is never
/// modified.
pub fn check_table(table: &TranslationTable, table_path: &str) -> CheckReport {
    let languages = table.languages();
    let mut report = CheckReport::default();

    let mut next_line = 2 + embedded_newlines(languages.iter().map(String::as_str));
    for (key, values) in table.rows() {
        let line = Some(next_line);
        next_line +=
            1 + embedded_newlines(std::iter::once(key).chain(values.iter().map(String::as_str)));
        report.keys_checked += 1;

        if values.len() != languages.len() {
            report.mismatched_keys += 1;
            let comparison = if values.len() > languages.len() {
                "more"
            } else {
                "fewer"
            };
            report.diagnostics.push(Diagnostic::warning(
                table_path,
                line,
                format!(
                    "Key '{}' has {} translations ({}) than languages specified ({})",
                    key,
                    comparison,
                    values.len(),
                    languages.len()
                ),
            ));
        }

        let missing: Vec<&str> = languages
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(language, _)| language.as_str())
            .collect();

        if !missing.is_empty() {
            report.incomplete_keys += 1;
            report.diagnostics.push(Diagnostic::warning(
                table_path,
                line,
                missing_message(key, &missing),
            ));
        }
    }

    report
}

fn embedded_newlines<'a>(cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(|cell| cell.matches('\n').count()).sum()
}

fn missing_message(key: &str, missing: &[&str]) -> String {
    if missing.len() == 1 {
        format!(
            "Missing translation for key '{}' for language {}",
            key, missing[0]
        )
    } else {
        format!(
            "Missing translations for key '{}' for languages: {}",
            key,
            missing.join(", ")
        )
    }
}
