use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "m0use")]
#[command(about = "Find nations in a region that accept recruitment telegrams")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a region for nations that can receive recruitment telegrams
    Scan {
        /// Region whose members are checked (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,

        /// Region the telegrams would be sent from (defaults to the scanned region)
        #[arg(short, long)]
        from: Option<String>,

        /// Newline-separated list of nations to skip
        #[arg(short, long)]
        exclude: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Maximum lookups in flight (overrides api.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// List the nations in a region
    Members {
        /// Region to list (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Check a single nation's recruitment eligibility
    Check {
        /// Nation name
        nation: String,

        /// Region the telegram would be sent from (defaults to the configured region)
        #[arg(short, long)]
        from: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
