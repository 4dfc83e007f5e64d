use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ui::OutputFormat;

/// Keep the desktop wallpaper in sync with a remotely published image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print debug events
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Config file (defaults to <config dir>/gistwall/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check the endpoint on a fixed schedule until interrupted
    Run,
    /// Run a single check now
    Check,
    /// Show recently applied wallpapers
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}
