use anyhow::Result;
use std::path::Path;

use crate::commands::print_sync_report;
use crate::config::Config;
use crate::fs::RealFileSystem;
use crate::logging;
use crate::sync::{self, SyncOptions};

pub fn run(config: &Config, source: &Path, options: &SyncOptions) -> Result<()> {
    logging::info("=== locsheet convert ===\n");

    let cwd = std::env::current_dir()?;
    let table_path = config.table_path(&cwd);

    logging::info("Configuration:");
    logging::info(&format!("  Resources: {}", source.display()));
    logging::info(&format!("  Table: {}", table_path.display()));
    logging::info(&format!(
        "  Resource files: *.{}/*.{}",
        config.resource_dir_suffix, config.resource_extension
    ));

    let report = sync::run_convert(config, source, &table_path, options, &RealFileSystem)?;
    print_sync_report(&report);
    Ok(())
}
