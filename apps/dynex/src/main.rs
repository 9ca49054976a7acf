//! # Dynex
//!
//! Command-line front end for `dynex-core`.
//!
//! ## Usage
//!
//! ```bash
//! # Start a dynamic snapshot with integer time
//! dynex init -t integer
//!
//! # Record writes, then export
//! dynex ingest -f writes.json
//! dynex export -o attvalues.xml --step 10
//!
//! dynex status
//! ```

use clap::Parser;
use dynex::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // DYNEX_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("DYNEX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "dynex=debug,dynex_core=debug"
    } else {
        "dynex=info,dynex_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays clean for --json-mode.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Dynex startup banner.
fn print_banner() {
    println!(
        r#"
  ╔╦╗╦ ╦╔╗╔╔═╗═╗ ╦
   ║║╚╦╝║║║║╣ ╔╩╦╝
  ═╩╝ ╩ ╝╚╝╚═╝╩ ╚═

  Dynamic attribute export v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
