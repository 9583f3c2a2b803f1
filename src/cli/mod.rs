//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "govrag",
    version,
    author = "neur0map",
    about = "Ask questions about scraped government services and agencies",
    long_about = "govrag indexes scraped agency and service records with text embeddings, \
                  retrieves the records nearest to a question and optionally asks a language \
                  model to answer from them."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/govrag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply (e.g., "offline")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve the records nearest to a question
    Query {
        /// Question text
        question: String,

        /// Number of records to return
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,

        /// Scraped agency JSON file (defaults to corpus.data_file)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the nearest records
    Ask {
        /// Question to ask
        question: String,

        /// Skip generation and print the retrieved context
        #[arg(long)]
        offline: bool,

        /// Scraped agency JSON file (defaults to corpus.data_file)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
