//! archgraph CLI tool.
//!
//! Usage:
//! ```bash
//! archgraph check [OPTIONS] [PATH]
//! archgraph dump [OPTIONS] [PATH]
//! archgraph init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod sources;

/// Class dependency graph and slice cycle checker for compiled JVM code
#[derive(Parser)]
#[command(name = "archgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import class files and check slice cycle rules
    Check {
        /// Class file, jar, or directory to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Abort on the first malformed class file
        #[arg(long)]
        fail_fast: bool,
    },

    /// Import class files and print the resolved graph
    Dump {
        /// Class file, jar, or directory to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: DumpFormat,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

/// Output format for graph dumps.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum DumpFormat {
    /// Summary statistics.
    #[default]
    Text,
    /// Full resolved graph as JSON.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Check { path, format, fail_fast } => {
            commands::check::run(&path, format, fail_fast, cli.config.as_deref())
        }
        Commands::Dump { path, format } => commands::dump::run(&path, format),
        Commands::Init { force } => commands::init::run(force),
    }
}
