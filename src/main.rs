mod config;
mod core;
mod error;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, ConfigManager};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::fixed_list::FixedListConverter;
use crate::core::tree::TreeConverter;
use crate::utils::encoding::Codec;

#[derive(Parser, Debug)]
#[command(name = "html-utf8", version, about = "Convert legacy-encoded HTML files to UTF-8")]
struct Cli {
    /// Path to config file (default: html_utf8_config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a fixed list of Windows-1252 files in place
    FixedList {
        /// Directory holding the files
        #[arg(long)]
        dir: Option<String>,
        /// File names to convert (default: the configured list)
        files: Vec<String>,
    },
    /// Back up and convert every HTML file under a directory
    Tree {
        /// Root directory to walk
        #[arg(long)]
        root: Option<String>,
        /// Name of the backup folder created under the root
        #[arg(long)]
        backup_dir: Option<String>,
    },
    /// Write the default configuration file
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    match cli.command {
        Commands::FixedList { dir, files } => {
            let mut config = manager.load();
            if let Some(dir) = dir {
                config.fixed_list.directory = dir;
            }
            if !files.is_empty() {
                config.fixed_list.files = files;
            }
            run_fixed_list(&config)
        }
        Commands::Tree { root, backup_dir } => {
            let mut config = manager.load();
            if let Some(root) = root {
                config.tree.root = root;
            }
            if let Some(backup_dir) = backup_dir {
                config.tree.backup_dir_name = backup_dir;
            }
            run_tree(&config)
        }
        Commands::InitConfig => {
            manager.save(&Config::default()).with_context(|| {
                format!(
                    "Failed to write config to {}",
                    manager.get_config_file_path().display()
                )
            })?;
            info!(
                "Wrote default config to {}",
                manager.get_config_file_path().display()
            );
            Ok(())
        }
    }
}

fn run_fixed_list(config: &Config) -> Result<()> {
    let report = FixedListConverter::new(&config.fixed_list)
        .run()
        .context("Fixed-list conversion aborted")?;

    info!(
        "Converted {} file(s), skipped {}",
        report.converted.len(),
        report.skipped.len()
    );
    Ok(())
}

fn run_tree(config: &Config) -> Result<()> {
    let converter = TreeConverter::new(&config.tree).context("Invalid tree configuration")?;
    let report = converter.run().context("Tree conversion aborted")?;

    for outcome in &report.outcomes {
        if outcome.codec == Codec::Latin1 {
            warn!(
                "{} fell back to Latin-1; check its characters",
                outcome.path.display()
            );
        }
    }
    Ok(())
}
