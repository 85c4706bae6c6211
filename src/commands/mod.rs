pub mod check;
pub mod convert;
pub mod extract;

use crate::logging;
use crate::store::SaveOutcome;
use crate::sync::SyncReport;

/// Print the outcome of an extract or convert run, diagnostics first.
pub(crate) fn print_sync_report(report: &SyncReport) {
    report.diagnostics.emit();
    report.check.diagnostics.emit();

    logging::info("");
    logging::info("Summary:");
    logging::info(&format!("  Languages: {}", report.languages.join(", ")));
    logging::info(&format!("  Files scanned: {}", report.files_scanned));
    if report.files_unchanged > 0 {
        logging::info(&format!(
            "  Files not modified since last run: {}",
            report.files_unchanged
        ));
    }
    if report.translations_imported > 0 {
        logging::info(&format!(
            "  Translations imported: {}",
            report.translations_imported
        ));
    }
    logging::info(&format!("  Keys added: {}", report.added_keys.len()));
    for key in &report.added_keys {
        logging::debug(&format!("    + {}", key));
    }
    if !report.removed_keys.is_empty() {
        logging::info(&format!("  Keys removed: {}", report.removed_keys.len()));
        for key in &report.removed_keys {
            logging::info(&format!("    - {}", key));
        }
    }
    logging::info(&format!("  Total keys: {}", report.total_keys));
    if report.check.incomplete_keys > 0 {
        logging::info(&format!(
            "  Keys with missing translations: {}",
            report.check.incomplete_keys
        ));
    }

    let path = report.table_path.display();
    match report.save {
        SaveOutcome::Written => logging::info(&format!("\nSaved {}", path)),
        SaveOutcome::Unchanged => logging::info(&format!("\n{} is up to date.", path)),
        SaveOutcome::DryRun => logging::info(&format!("\n[Dry run] {} was not written.", path)),
        SaveOutcome::Skipped => logging::warn(&format!(
            "{} could not be read and was left untouched; fix or remove it and run again",
            path
        )),
    }
}
