//! The `emberd` binary entrypoint: parses CLI args, loads config, opens a
//! `Node`, and idles reporting operability metrics. No network or RPC loop
//! drives this process (both are explicit Non-goals); it exists to host
//! the store/consensus/mempool core for collaborators embedding it, and to
//! let an operator inspect or seed a chain from the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use emberd::cli::{Cli, Command};
use emberd::{metrics, Config, Node};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(config_path: Option<&PathBuf>, data_dir: Option<PathBuf>, testnet: bool) -> color_eyre::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if testnet {
        config.network = ember_chain::parameters::Network::Testnet;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::GenerateConfig { path, testnet } => {
            let mut config = Config::default();
            if testnet {
                config.network = ember_chain::parameters::Network::Testnet;
            }
            std::fs::write(&path, config.to_toml_string()?)?;
            info!(path = %path.display(), "wrote default config");
            Ok(())
        }
        Command::Start { testnet, data_dir } => {
            let config = load_config(cli.config.as_ref(), data_dir, testnet)?;
            info!(network = ?config.network, data_dir = %config.data_dir.display(), "starting emberd");

            if let Some(addr) = &config.metrics_addr {
                let addr = addr.parse()?;
                metrics::install(addr)?;
                info!(%addr, "metrics exporter listening");
            }

            let node = Node::open(&config)?;
            if let Some(tip) = node.get_tip()? {
                info!(height = tip.best_height, hash = ?tip.best_hash, "chain tip");
            }

            loop {
                if let Some(tip) = node.get_tip()? {
                    metrics::record_tip_height(tip.best_height);
                }
                let snapshot = node.get_mempool_snapshot();
                metrics::record_mempool_size(snapshot.iter().map(|e| e.size).sum(), snapshot.len());
                std::thread::sleep(Duration::from_secs(10));
            }
        }
    }
}
