use anyhow::{bail, Result};

use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::logging;
use crate::sync;

pub fn run(config: &Config, fail_on_missing: bool) -> Result<()> {
    logging::info("=== locsheet check ===\n");

    let cwd = std::env::current_dir()?;
    let table_path = config.table_path(&cwd);
    logging::info(&format!("Checking {}", table_path.display()));

    let (report, diagnostics) = sync::run_check(&table_path, &RealFileSystem)?;
    diagnostics.emit();
    report.diagnostics.emit();

    logging::info(&format!("  Keys checked: {}", report.keys_checked));
    logging::info(&format!(
        "  Keys with missing translations: {}",
        report.incomplete_keys
    ));
    logging::info(&format!(
        "  Keys with a wrong number of columns: {}",
        report.mismatched_keys
    ));

    if diagnostics.has_errors() {
        logging::warn("The table could not be fully loaded; results are incomplete");
    } else if report.is_clean() {
        logging::info("\nAll keys are translated.");
    }

    if fail_on_missing && diagnostics.has_errors() {
        bail!("The translation table could not be loaded (--fail-on-missing enabled)");
    }
    if fail_on_missing && !report.is_clean() {
        bail!(
            "{} warning(s) reported (--fail-on-missing enabled)",
            report.diagnostics.len()
        );
    }

    Ok(())
}
