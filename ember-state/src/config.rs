use std::path::PathBuf;

use ember_chain::parameters::Network;

/// Store configuration: where on disk the database lives.
///
/// Mirrors the teacher's `Config::sled_config(network)` pattern — one
/// database directory per network, so mainnet and testnet data never mix.
#[derive(Clone, Debug)]
pub struct Config {
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn ephemeral() -> Self {
        Config {
            cache_dir: std::env::temp_dir().join(format!("ember-state-{}", std::process::id())),
        }
    }

    fn db_path(&self, network: Network) -> PathBuf {
        let network_dir = match network {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        };
        self.cache_dir.join("state").join(network_dir)
    }

    pub fn sled_config(&self, network: Network) -> sled::Config {
        sled::Config::default().path(self.db_path(network))
    }
}

impl Default for Config {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ember");
        Config { cache_dir }
    }
}
