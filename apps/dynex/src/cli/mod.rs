//! # Dynex CLI Module
//!
//! This module implements the CLI interface for Dynex.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty snapshot
//! - `ingest` - Apply a JSON write script to the snapshot
//! - `advance` - Move the snapshot clock forward
//! - `export` - Export the snapshot as GEXF attvalue XML
//! - `status` - Show snapshot status

mod commands;

use crate::config::DynexConfig;
use clap::{Parser, Subcommand};
use dynex_core::{DynexError, TimeFormat};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Dynex - dynamic graph attribute export
///
/// Records attribute writes on a step axis and exports them as
/// interval-tagged GEXF attvalue elements.
#[derive(Parser, Debug)]
#[command(name = "dynex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the session snapshot
    #[arg(short = 'S', long, global = true, default_value = "dynex.snap")]
    pub snapshot: PathBuf,

    /// Path to a config file (defaults to ./dynex.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(short, long)]
        force: bool,

        /// Declare the graph static (no start/end bounds)
        #[arg(long)]
        r#static: bool,

        /// Time format (integer, double, date, datetime)
        #[arg(short = 't', long)]
        time_format: Option<TimeFormat>,
    },

    /// Apply a JSON write script
    Ingest {
        /// Path to the script file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Move the clock forward without writing
    Advance {
        /// Target step
        #[arg(short, long)]
        step: f64,
    },

    /// Export all records as GEXF attvalue XML
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Advance the clock to this step before exporting
        #[arg(short, long)]
        step: Option<f64>,

        /// Force the static shape (no start/end)
        #[arg(long, conflicts_with = "dynamic")]
        r#static: bool,

        /// Force the dynamic shape (start/end included)
        #[arg(long)]
        dynamic: bool,

        /// Override the time format for this export
        #[arg(short = 't', long)]
        time_format: Option<TimeFormat>,

        /// Do not write the sealed records back to the snapshot
        #[arg(long)]
        no_save: bool,
    },

    /// Show snapshot status
    Status,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), DynexError> {
    let config = DynexConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init {
            force,
            r#static,
            time_format,
        }) => cmd_init(
            &cli.snapshot,
            &config,
            force,
            r#static,
            time_format,
            json_mode,
        ),
        Some(Commands::Ingest { file }) => cmd_ingest(&cli.snapshot, &config, &file, json_mode),
        Some(Commands::Advance { step }) => cmd_advance(&cli.snapshot, &config, step, json_mode),
        Some(Commands::Export {
            output,
            step,
            r#static,
            dynamic,
            time_format,
            no_save,
        }) => {
            let shape = match (r#static, dynamic) {
                (true, _) => Some(false),
                (_, true) => Some(true),
                _ => None,
            };
            let options = ExportOptions {
                step,
                dynamic: shape,
                time_format,
                save: !no_save,
            };
            cmd_export(&cli.snapshot, &config, &output, &options, json_mode)
        }
        Some(Commands::Status) | None => cmd_status(&cli.snapshot, &config, json_mode),
    }
}
