use anyhow::Result;
use std::path::Path;

use crate::commands::print_sync_report;
use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::logging;
use crate::sync::{self, SyncOptions};

pub fn run(config: &Config, source: &Path, options: &SyncOptions) -> Result<()> {
    logging::info("=== locsheet extract ===\n");

    let cwd = std::env::current_dir()?;
    let table_path = config.table_path(&cwd);

    logging::info("Configuration:");
    logging::info(&format!("  Source: {}", source.display()));
    logging::info(&format!("  Table: {}", table_path.display()));
    logging::info(&format!("  Function: {}", config.function));
    logging::info(&format!("  Extensions: {}", config.extensions.join(", ")));
    if options.clean {
        logging::info("  Mode: full rescan, removing unused keys");
    } else if options.force_rescan {
        logging::info("  Mode: full rescan");
    }

    let report = sync::run_extract(config, source, &table_path, options, &RealFileSystem)?;
    print_sync_report(&report);
    Ok(())
}
