//! docver CLI Library
//!
//! Command-line tooling around versioning configurations:
//!
//! - **Validation**: compile a configuration file (`docver validate`)
//! - **Restrictions**: allowed save options for a type and lifecycle state (`docver options`)
//! - **Labels**: format a version label (`docver label`)

pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docver - document versioning configuration tool
#[derive(Parser, Debug)]
#[command(name = "docver")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and compile a versioning configuration file
    Validate {
        /// TOML configuration file
        file: PathBuf,
    },

    /// Print the options a save may request
    Options {
        /// TOML configuration file
        #[arg(short, long, env = "DOCVER_VERSIONING_CONFIG")]
        config: PathBuf,

        /// Document type
        #[arg(short = 't', long = "type")]
        doc_type: String,

        /// Lifecycle state (none when omitted)
        #[arg(short, long)]
        state: Option<String>,

        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Format a version label
    Label {
        major: u64,
        minor: u64,

        /// Label of a checked-out document
        #[arg(long)]
        checked_out: bool,
    },
}
