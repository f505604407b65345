//! CLI definition for the `prefer` binary.
//!
//! Loads a single configuration identifier and prints it, or keeps watching
//! it and prints every update.

use crate::logging::LogTarget;
use clap::Parser;

/// Locate, load and optionally watch a configuration file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration identifier: bare name, name with extension, or absolute path
    pub identifier: String,

    /// Keep watching the file and print every update until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: LogTarget,
}
