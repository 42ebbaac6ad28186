use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use matchstore::common::DEFAULT_BACKUP_RETENTION;
use matchstore::RuntimeMode;

mod commands;

/// matchstore: maintenance utility for a local document store.
///
/// Every command works on the JSON files of one data directory.
#[derive(Parser)]
#[command(name = "matchstore", version, about, long_about = None)]
struct Cli {
    /// Data directory. Defaults to MATCHSTORE_DATA_DIR or ./data.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Run as production: restore, import and clear are refused.
    #[arg(long, global = true)]
    production: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the document count of every collection.
    Stats,

    /// Check required fields and timestamps; exits with 1 on issues.
    Validate,

    /// Write a full backup of every collection.
    Backup,

    /// Replace collections with the contents of a backup file.
    Restore {
        /// Backup file to restore.
        file: PathBuf,
    },

    /// Export every collection into a migration envelope.
    Export {
        /// Output file. Defaults to a timestamped file in the current directory.
        file: Option<PathBuf>,
    },

    /// Import collections from a migration envelope.
    Import {
        /// Envelope written by `export`.
        file: PathBuf,
    },

    /// Delete all but the most recent backup files.
    Cleanup {
        /// Number of backups to keep.
        #[arg(long, default_value_t = DEFAULT_BACKUP_RETENTION)]
        keep: usize,
    },

    /// Empty every collection after taking a backup.
    Clear,

    /// List backup files, newest first.
    Backups,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mode = cli.production.then_some(RuntimeMode::Production);
    let store = match commands::open_store(cli.data_dir.as_deref(), mode) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Stats => commands::stats(&store),
        Commands::Validate => commands::validate(&store),
        Commands::Backup => commands::backup(&store),
        Commands::Restore { file } => commands::restore(&store, &file),
        Commands::Export { file } => commands::export(&store, file.as_deref()),
        Commands::Import { file } => commands::import(&store, &file),
        Commands::Cleanup { keep } => commands::cleanup(&store, keep),
        Commands::Clear => commands::clear(&store),
        Commands::Backups => commands::backups(&store),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
