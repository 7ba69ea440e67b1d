//! CLI argument definitions using clap
//!
//! Commands:
//! - querygate serve --config <path>
//! - querygate query --config <path> --plan <file>
//! - querygate compile --config <path> --plan <file>
//! - querygate check --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// querygate - entity-based, injection-safe queries over SQL
#[derive(Parser, Debug)]
#[command(name = "querygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server and the token sweeper
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Execute one plan against the database and print the result
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,

        /// Plan file; "-" reads stdin
        #[arg(long, default_value = "-")]
        plan: PathBuf,
    },

    /// Validate and compile one plan without touching the database
    Compile {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,

        /// Plan file; "-" reads stdin
        #[arg(long, default_value = "-")]
        plan: PathBuf,
    },

    /// Load the configuration and mapping and list queryable entities
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
