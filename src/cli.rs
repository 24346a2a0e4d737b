//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// List and save recordings from a Fetch TV box.
///
/// Finds the box on the local network (or at `--ip`), lists its recordings
/// and optionally saves them below `--save`, skipping anything already saved
/// or still being recorded.
#[derive(Parser, Debug)]
#[command(name = "fetchtv")]
#[command(author, version, about)]
pub struct Args {
    /// Print the discovered server details
    #[arg(long)]
    pub info: bool,

    /// List or save recordings
    #[arg(long)]
    pub recordings: bool,

    /// List the names of shows with available recordings
    #[arg(long, conflicts_with = "isrecording")]
    pub shows: bool,

    /// List any items that are currently recording
    #[arg(long)]
    pub isrecording: bool,

    /// IP address of the server, skips auto-discovery
    #[arg(long)]
    pub ip: Option<String>,

    /// Port of the server when using --ip [default: 49152]
    #[arg(long)]
    pub port: Option<u16>,

    /// Save and overwrite recordings that were already saved
    #[arg(long)]
    pub overwrite: bool,

    /// Save recordings to the specified path
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Only include folders containing this text (repeatable)
    #[arg(long, value_name = "TEXT")]
    pub folder: Vec<String>,

    /// Skip folders containing this text (repeatable)
    #[arg(long, value_name = "TEXT")]
    pub exclude: Vec<String>,

    /// Only include recordings whose title contains this text (repeatable)
    #[arg(long, value_name = "TEXT")]
    pub title: Vec<String>,

    /// Print listings and save results as JSON
    #[arg(long)]
    pub json: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// True when any catalog listing or save was requested.
    #[must_use]
    pub fn wants_catalog(&self) -> bool {
        self.recordings || self.shows || self.isrecording
    }
}
