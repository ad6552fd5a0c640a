//! CLI argument definitions using clap
//!
//! Commands:
//! - isekai-api serve [--config <path>] [--port <n>]
//! - isekai-api check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Isekai API - population statistics over PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "isekai-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the database and serve the HTTP API
    Serve {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on, overrides config and environment
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the effective configuration with secrets redacted
    CheckConfig {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
