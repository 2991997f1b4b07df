//! Command-line surface (spec.md §1's ambient CLI layer), grounded on the
//! pack's `rill-node` binary's `clap::Parser` flag set — trimmed to this
//! core's actual scope (no P2P, no RPC bind flags, since both are
//! Non-goals).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "emberd", version, about = "The Ember full node daemon")]
pub struct Cli {
    /// Path to a TOML config file; defaults to `<data-dir>/emberd.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the node, opening its store and replaying/extending the chain.
    Start {
        /// Connect to testnet instead of mainnet.
        #[arg(long)]
        testnet: bool,
        /// Override the data directory from the config file.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Write a default config file to the given path.
    GenerateConfig {
        /// Where to write the generated config.
        path: PathBuf,
        #[arg(long)]
        testnet: bool,
    },
}
