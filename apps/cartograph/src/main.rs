//! # Cartograph
//!
//! The maintenance binary for cartograph navigation maps.
//!
//! ## Usage
//!
//! ```bash
//! # Summary of the newest map in ./data
//! cartograph status
//!
//! # Route and nearest bank from room 228
//! cartograph --map-dir maps/gs path 228 3498
//! cartograph nearest 228 --tag bank
//!
//! # Rewrite the newest map as XML
//! cartograph convert --to xml
//! ```

use cartograph::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // CARTOGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CARTOGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "cartograph=debug,cartograph_core=debug"
    } else {
        "cartograph=info,cartograph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so command output stays pipeable.
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

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
