//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mdpress markdown content server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root containing mdpress.toml, data/, template/ and public/
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: mdpress.toml)
    #[arg(short = 'C', long, default_value = "mdpress.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the content root over HTTP
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// reload the blacklist when it changes
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Request worker threads (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Render a single request path and print the page to stdout
    Render {
        /// Request path, e.g. `/blog/first-post`
        path: String,
    },

    /// Validate config, blacklist and mandatory pages, then exit
    Check,
}
