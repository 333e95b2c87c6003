//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blocklist-combiner")]
#[command(
    author,
    version,
    about = "Merge category domain blocklists into deduplicated DNS blackhole lists"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (built-in defaults are used if it does not exist)
    #[arg(short, long, default_value = "blocklist-combiner.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every enabled source, then merge and partition the lists
    Run {
        /// Report format (text, json)
        #[arg(long, short, default_value = "text")]
        format: String,

        /// Reuse the raw files already in the work directory
        #[arg(long)]
        skip_fetch: bool,
    },

    /// Fetch every enabled source into the work directory only
    Fetch,

    /// Merge and partition the raw files already in the work directory
    Combine {
        /// Report format (text, json)
        #[arg(long, short, default_value = "text")]
        format: String,
    },

    /// Union same-named list files from two directories
    Merge {
        /// First source directory
        dir1: PathBuf,

        /// Second source directory
        dir2: PathBuf,

        /// Output directory
        #[arg(long, short, default_value = "merged")]
        output: PathBuf,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version
    Version,
}
