//! Treewatch CLI - treewatch command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod logging;
mod settings;

/// Treewatch - recursive directory change notifications
#[derive(Parser)]
#[command(name = "treewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and print every change
    Watch {
        /// Directories to watch; a trailing '/' watches only the top level
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Comma separated event names (e.g. create,delete,moved_to)
        #[arg(long)]
        events: Option<String>,

        /// Exit after this many milliseconds without events (-1 = never)
        #[arg(long, allow_negative_numbers = true)]
        timeout_ms: Option<i64>,

        /// Delay between the first event and reading a batch, 0-1000 ms
        #[arg(long)]
        coalesce_ms: Option<u64>,

        /// Config file (default: <config dir>/treewatch/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Show configuration file location or an example
    Config {
        /// Print the config file path (default)
        #[arg(long, conflicts_with = "example")]
        path: bool,

        /// Print an example config file
        #[arg(long)]
        example: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Watch { log_file, .. } => log_file.clone(),
        Commands::Config { .. } => None,
    };
    let _log_guard = logging::init(log_file.as_deref())?;

    match cli.command {
        Commands::Watch {
            paths,
            events,
            timeout_ms,
            coalesce_ms,
            config,
            log_file: _,
        } => {
            let overrides = cmd::watch::Overrides {
                events,
                timeout_ms,
                coalesce_ms,
            };
            cmd::watch::run(&paths, overrides, config.as_deref())
        }
        Commands::Config { path, example } => {
            if example && !path {
                cmd::config::run_example()
            } else {
                cmd::config::run_path()
            }
        }
    }
}
