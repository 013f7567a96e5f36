//! # Cartograph CLI Module
//!
//! Command-line access to a map directory.
//!
//! ## Available Commands
//!
//! - `status` - Show map summary counts
//! - `room` - Show one room
//! - `path` - Shortest route between two rooms
//! - `nearest` - Closest room carrying a tag or among a list
//! - `tags` - List every tag in the map
//! - `convert` - Save the latest map in another format
//! - `check` - Integrity and dangling-edge report

mod commands;

use crate::config::CartographConfig;
use cartograph_core::{MapFormat, NavError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Cartograph - navigation maps for text games
///
/// Loads the newest map file from a directory and answers travel queries.
#[derive(Parser, Debug)]
#[command(name = "cartograph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Map directory (overrides config and environment)
    #[arg(short = 'd', long, global = true)]
    pub map_dir: Option<PathBuf>,

    /// Game profile: gemstone (gs) or dragonrealms (dr)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

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
    /// Show map summary counts
    Status,

    /// Show one room
    Room {
        /// Room id
        id: u32,
    },

    /// Shortest route between two rooms
    Path {
        /// Starting room id
        from: u32,

        /// Destination room id
        to: u32,
    },

    /// Closest reachable room carrying a tag or among a list of ids
    Nearest {
        /// Starting room id
        from: u32,

        /// Tag to search for
        #[arg(short, long, conflicts_with = "ids")]
        tag: Option<String>,

        /// Candidate room ids (comma-separated)
        #[arg(long)]
        ids: Option<String>,

        /// List every tagged room, nearest first
        #[arg(short, long, requires = "tag")]
        all: bool,
    },

    /// List every tag in the map
    Tags,

    /// Save the latest map in another format
    Convert {
        /// Target format (json, xml)
        #[arg(short, long)]
        to: MapFormat,
    },

    /// Check map integrity and report broken edges
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: defaults, file, environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<CartographConfig, NavError> {
    let mut config = CartographConfig::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(dir) = &cli.map_dir {
        config.map_dir = dir.clone();
    }
    if let Some(profile) = &cli.profile {
        config.profile = profile.clone();
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), NavError> {
    let config = resolve_config(&cli)?;
    let store = config.build_store()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&store, json_mode),
        Some(Commands::Room { id }) => cmd_room(&store, json_mode, id),
        Some(Commands::Path { from, to }) => cmd_path(&store, json_mode, from, to),
        Some(Commands::Nearest {
            from,
            tag,
            ids,
            all,
        }) => cmd_nearest(&store, json_mode, from, tag.as_deref(), ids.as_deref(), all),
        Some(Commands::Tags) => cmd_tags(&store, json_mode),
        Some(Commands::Convert { to }) => cmd_convert(&store, json_mode, to),
        Some(Commands::Check) => cmd_check(&store, json_mode),
    }
}
