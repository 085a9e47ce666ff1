//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run the built-in sample suite locally or sharded across workers
#[derive(Parser, Debug)]
#[command(name = "disttest")]
#[command(version)]
#[command(about = "Test execution engine with local and sharded concurrent runs")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the registered test definitions
    Run(RunArgs),

    /// List registered definitions and their test methods
    List,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Execution mode (local, distributed)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Number of workers in distributed mode
    #[arg(short, long)]
    pub nodes: Option<usize>,

    /// Timeout for a distributed run, in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Write a JSON run log
    #[arg(long)]
    pub json_log: bool,

    /// Directory for the JSON run log
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Print the final result (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
