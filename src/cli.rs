//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linea-airdrop-checker")]
#[command(about = "LINEA airdrop allocation checker backed by Multicall3", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.toml")]
    pub config: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Override server.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Resolve allocations once and print the result as JSON
    Check {
        /// Wallet addresses
        addresses: Vec<String>,

        /// Read addresses from a file ("-" for stdin), separated by whitespace, commas or semicolons
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Token decimals used for formatting
        #[arg(short, long)]
        decimals: Option<u8>,
    },
}
