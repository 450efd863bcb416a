use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Query Sentinel - SQL performance diagnostics from EXPLAIN plans
#[derive(Parser, Debug)]
#[command(name = "query-sentinel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze SQL statements, optionally with captured EXPLAIN output
    Analyze {
        /// Path to SQL file (use - for stdin)
        #[arg(short, long)]
        queries: PathBuf,

        /// Captured EXPLAIN output: .json (tabular rows or plan tree) or
        /// plain text (EXPLAIN ANALYZE)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Show internal diagnostics
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Analyze a batch of captured queries from a profiler log
    Profile {
        /// Path to a JSON capture log (array of {sql, bindings, elapsed_ms})
        #[arg(short, long)]
        captures: PathBuf,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Show slowest query details
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
