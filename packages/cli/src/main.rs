#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the listing extraction tool.
//!
//! Reads every saved `.html` listing page in the input directory, extracts
//! one property record per page and writes them all to a single CSV.
//!
//! Uses `indicatif-log-bridge` (via [`propscrape_cli_utils::init_logger`])
//! so log lines and the progress bar share the terminal cleanly.

mod config;
mod run;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Overrides, RunConfig, Settings};

#[derive(Parser)]
#[command(
    name = "propscrape",
    about = "Extract property records from saved listing pages into a CSV"
)]
struct Cli {
    /// TOML config file (defaults to `propscrape.toml` in the working
    /// directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory containing the saved `.html` pages
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory the CSV is written to (created if missing)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Process only the first few files, print the CSV and write it to the
    /// test-run output file
    #[arg(long)]
    test_run: bool,
    /// Maximum number of files to process
    #[arg(long)]
    limit: Option<usize>,
    /// Number of pages parsed concurrently (defaults to the CPU count)
    #[arg(long)]
    jobs: Option<usize>,
}

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The input directory could not be listed.
    #[error("cannot read input directory {}: {source}", path.display())]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem error while preparing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the CSV failed.
    #[error(transparent)]
    Export(#[from] propscrape_export::ExportError),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = propscrape_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = RunConfig::discover(cli.config.as_deref())?;
    let settings = Settings::resolve(
        config,
        Overrides {
            input_dir: cli.input,
            output_dir: cli.output_dir,
            jobs: cli.jobs,
            limit: cli.limit,
            test_run: cli.test_run,
        },
    );

    if settings.test_run {
        log::info!("Test run: writing {}", settings.output_path().display());
    }

    run::run(&settings, &multi).await?;
    Ok(())
}
