//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// gdrive-sync - Mirror a Google Drive folder into a local directory.
///
/// Native Google documents are exported (docx, xlsx, pptx, png, json);
/// regular files are downloaded unless a local copy of the same size exists.
/// Nothing is ever deleted locally.
#[derive(Parser, Debug)]
#[command(name = "gdrive-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Summary format: text, json, or table.
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    /// Configuration file (default: ~/.gdrive-local-sync/config.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync a Drive folder into a local directory.
    Sync {
        /// Drive folder URL or folder ID.
        folder: String,

        /// Local target directory (created if missing).
        local_path: PathBuf,

        /// Exit with status 2 if any entry failed.
        #[arg(long)]
        strict: bool,

        /// Suppress per-file progress lines.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the folder ID extracted from a URL, without contacting Drive.
    Parse {
        /// Drive folder URL or folder ID.
        folder: String,
    },

    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Write a commented default config file if none exists.
    Init,
    /// Print the effective configuration.
    Show,
    /// Print the config file location.
    Path,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
