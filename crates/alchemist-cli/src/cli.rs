//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Alchemist: reconcile, validate and apply rules to client/worker/task tables
#[derive(Parser)]
#[command(name = "alchemist")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file (mapper, advisor and parser settings)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Advisor consulted while mapping headers
    #[arg(long, global = true, default_value = "none")]
    pub advisor: AdvisorChoice,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how a file would be classified and mapped
    Inspect {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load files and report validation and rule problems
    Validate {
        /// Data files to load (CSV/TSV/JSON)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Rules file to check against the data
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load files, apply rules and export the result
    Apply {
        /// Data files to load (CSV/TSV/JSON)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Rules file to apply
        #[arg(short, long)]
        rules: PathBuf,

        /// Output directory for exported tables and rules
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Advisor choice for header mapping
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AdvisorChoice {
    /// No advisor - deterministic mapping only
    #[default]
    None,
    /// OpenAI-compatible chat API (requires OPENAI_API_KEY)
    OpenAI,
    /// Mock advisor for testing
    Mock,
}

impl std::str::FromStr for AdvisorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(AdvisorChoice::None),
            "openai" | "gpt" => Ok(AdvisorChoice::OpenAI),
            "mock" | "test" => Ok(AdvisorChoice::Mock),
            _ => Err(format!("Unknown advisor: {}. Use: none, openai, or mock.", s)),
        }
    }
}

impl std::fmt::Display for AdvisorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisorChoice::None => write!(f, "none"),
            AdvisorChoice::OpenAI => write!(f, "openai"),
            AdvisorChoice::Mock => write!(f, "mock"),
        }
    }
}
