//! CLI interface for gold-ticker
//!
//! Provides subcommands for:
//! - `run`: Stream prices (live or simulated) to the log
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gold-ticker")]
#[command(about = "Live spot price feed with automatic fallback to simulated data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream prices until Ctrl-C
    Run(RunArgs),
    /// Show configuration
    Config,
}
