//! ticket-watch - Ticket listing price and availability monitor
//!
//! Reads page captures left by an external fetcher and reports section price
//! and availability changes since the last run.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticket_watch::commands::{CheckCommand, ExtractCommand, SnapshotCommand};
use ticket_watch::config::{Config, OutputFormat};
use ticket_watch::snapshot::ObservationMode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ticket-watch",
    version,
    about = "Ticket listing price and availability monitor",
    long_about = "Extracts per-section prices from captured ticket listing pages and reports what changed since the last run."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, env = "TICKET_WATCH_FORMAT")]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every target and report changes
    #[command(alias = "c")]
    Check {
        /// Targets file (one URL per line)
        #[arg(short, long)]
        targets: Option<PathBuf>,

        /// Directory holding page captures
        #[arg(long)]
        captures: Option<PathBuf>,

        /// Snapshot file
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Do not write the snapshot file
        #[arg(long)]
        dry_run: bool,

        /// On a first observation, list prices instead of "new" entries
        #[arg(long)]
        quiet_first_run: bool,
    },

    /// Extract sections from local text and markup files
    #[command(alias = "x")]
    Extract {
        /// Visible text file
        #[arg(long)]
        text: Option<PathBuf>,

        /// Raw markup file
        #[arg(long)]
        markup: Option<PathBuf>,

        /// Observation mode
        #[arg(short, long, default_value = "price")]
        mode: ObservationMode,
    },

    /// Print the stored snapshot
    Snapshot {
        /// Only this target
        url: Option<String>,

        /// Snapshot file
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }

    let output = match cli.command {
        Commands::Check { targets, captures, state, dry_run, quiet_first_run } => {
            if let Some(path) = targets {
                config.targets_path = path;
            }
            if let Some(dir) = captures {
                config.captures_dir = dir;
            }
            if let Some(path) = state {
                config.state_path = path;
            }
            if quiet_first_run {
                config.quiet_first_run = true;
            }

            CheckCommand::new(config).dry_run(dry_run).execute()?
        }

        Commands::Extract { text, markup, mode } => {
            ExtractCommand::new(config).execute(text.as_deref(), markup.as_deref(), mode)?
        }

        Commands::Snapshot { url, state } => {
            if let Some(path) = state {
                config.state_path = path;
            }

            SnapshotCommand::new(config).execute(url.as_deref())?
        }
    };

    println!("{}", output);

    Ok(())
}
