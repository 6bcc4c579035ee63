//! Command-line arguments
//!
//! Every option can also be given through the environment:
//! `OSRS_CACHE_DIR`, `OSRS_ARCHIVE_URL`, `OSRS_GAME` and `OSRS_CACHE_ID`.

use clap::{Parser, Subcommand};
use osrs_assets::AssetKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "osrs-tool",
    about = "Browse and install Old School RuneScape cache snapshots",
    version
)]
pub struct Cli {
    /// Base directory holding one subdirectory per installed snapshot
    #[arg(long, env = "OSRS_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Cache archive base URL
    #[arg(long, env = "OSRS_ARCHIVE_URL", global = true)]
    pub archive_url: Option<String>,

    /// Game whose caches are resolved
    #[arg(long, env = "OSRS_GAME", default_value = "oldschool", global = true)]
    pub game: String,

    /// Use this snapshot instead of the latest one
    #[arg(long = "cache-id", env = "OSRS_CACHE_ID", global = true)]
    pub cache_id: Option<u32>,

    /// Recheck the latest snapshot unless it was checked in the last few minutes
    #[arg(long, global = true)]
    pub refresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the archive's caches for the game, newest first
    Caches {
        /// Show at most this many
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Download a whole snapshot and evict older ones
    Install,
    /// Count the records of one kind
    Count { kind: AssetKind },
    /// Print one record as JSON
    Show { kind: AssetKind, id: u32 },
}

impl Cli {
    /// Parse from the process arguments
    pub fn from_args() -> Self {
        Self::parse()
    }
}
