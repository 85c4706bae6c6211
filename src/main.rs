use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use locsheet::commands;
use locsheet::config::{first_duplicate, parse_list, Config};
use locsheet::logging::{self, LogLevel};
use locsheet::sync::SyncOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "locsheet")]
#[command(
    author,
    version,
    about = "Generate and merge a CSV-based localization table for Objective-C sources",
    long_about = None
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level: error, warn, info, debug
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that writes the table
#[derive(Args)]
struct TableArgs {
    /// Output directory for the localization table (overrides config)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// File name of the localization table (overrides config)
    #[arg(short = 'n', long)]
    file_name: Option<String>,

    /// Comma-separated list of languages; replaces the table's language columns
    #[arg(short, long)]
    languages: Option<String>,

    /// Preview changes without writing the table
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan source files for localization calls and merge new keys into the table
    Extract {
        /// Root directory of the sources to scan
        source: PathBuf,

        /// Name of localization routine (overrides config)
        #[arg(short = 's', long)]
        function: Option<String>,

        /// Comma-separated list of extensions of files which should be scanned
        #[arg(short, long)]
        extensions: Option<String>,

        /// Force rescan of all files (modification time will be ignored)
        #[arg(short = 'r', long)]
        force_rescan: bool,

        /// Remove keys no longer used in sources. Implies --force-rescan
        #[arg(short, long)]
        clean: bool,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Convert per-language .strings files found under a directory into the table
    Convert {
        /// Directory containing the per-language resource directories
        source: PathBuf,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Report missing translations in the table without scanning
    Check {
        /// Output directory for the localization table (overrides config)
        #[arg(short, long)]
        output_dir: Option<String>,

        /// File name of the localization table (overrides config)
        #[arg(short = 'n', long)]
        file_name: Option<String>,

        /// Exit with an error when any warning is reported
        #[arg(long)]
        fail_on_missing: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli).and_then(|_| run(cli)) {
        logging::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = match &cli.log_level {
        Some(value) => match LogLevel::parse(value) {
            Some(level) => level,
            None => bail!("Unknown log level '{}'", value),
        },
        None if cli.verbose => LogLevel::Debug,
        None if cli.quiet => LogLevel::Warn,
        None => LogLevel::Info,
    };
    logging::set_level(level);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(cli.config.as_ref())?;

    match cli.command {
        Commands::Extract {
            source,
            function,
            extensions,
            force_rescan,
            clean,
            table,
        } => {
            if let Some(function) = function {
                config.function = function;
            }
            if let Some(extensions) = extensions {
                config.extensions = parse_list(&extensions);
            }
            let options = apply_table_args(&mut config, table, force_rescan, clean)?;
            commands::extract::run(&config, &source, &options)
        }
        Commands::Convert { source, table } => {
            let options = apply_table_args(&mut config, table, false, false)?;
            commands::convert::run(&config, &source, &options)
        }
        Commands::Check {
            output_dir,
            file_name,
            fail_on_missing,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(name) = file_name {
                config.file_name = name;
            }
            config.validate()?;
            commands::check::run(&config, fail_on_missing)
        }
    }
}

fn apply_table_args(
    config: &mut Config,
    table: TableArgs,
    force_rescan: bool,
    clean: bool,
) -> Result<SyncOptions> {
    if let Some(dir) = table.output_dir {
        config.output_dir = dir;
    }
    if let Some(name) = table.file_name {
        config.file_name = name;
    }
    config.validate()?;

    let languages = table.languages.as_deref().map(parse_list);
    if let Some(list) = &languages {
        if list.is_empty() {
            bail!("--languages must name at least one language");
        }
        if let Some(language) = first_duplicate(list) {
            bail!("--languages lists '{}' more than once", language);
        }
    }

    Ok(SyncOptions {
        force_rescan,
        clean,
        languages,
        dry_run: table.dry_run,
    })
}
