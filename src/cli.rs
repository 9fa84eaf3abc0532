use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tilefuse::Variant;

#[derive(Parser)]
#[command(name = "tilefuse")]
#[command(author, version, about = "Consolidates per-year PMTiles archives by year range")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full consolidation batch
    Run {
        /// Merge strategy to use
        #[arg(long, value_enum, default_value_t = Variant::Merged)]
        variant: Variant,

        /// Directory holding the per-year source archives
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Directory receiving consolidated archives
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the commands that would run without executing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the configured year groups
    Plan,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
