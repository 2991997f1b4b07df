//! Node configuration, loaded from TOML (spec.md §1's ambient config
//! layer), grounded on `ember_state::Config`'s per-network data directory
//! pattern and on `rill-node`'s CLI-to-config flow.

use std::path::{Path, PathBuf};

use ember_chain::parameters::Network;
use serde::{Deserialize, Serialize};

fn default_network() -> Network {
    Network::Mainnet
}

fn default_max_mempool_size() -> usize {
    ember_chain::parameters::MAX_MEMPOOL_SIZE
}

/// On-disk and runtime configuration for one `emberd` instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(with = "network_serde")]
    pub network: Network,
    pub data_dir: PathBuf,
    pub max_mempool_size: usize,
    pub metrics_addr: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network: default_network(),
            data_dir: default_data_dir(),
            max_mempool_size: default_max_mempool_size(),
            metrics_addr: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("emberd")
}

mod network_serde {
    use ember_chain::parameters::Network;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Wire {
        Mainnet,
        Testnet,
    }

    pub fn serialize<S: Serializer>(network: &Network, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match network {
            Network::Mainnet => Wire::Mainnet,
            Network::Testnet => Wire::Testnet,
        };
        wire.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Network, D::Error> {
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Mainnet => Network::Mainnet,
            Wire::Testnet => Network::Testnet,
        })
    }
}

impl Config {
    /// Parse a TOML config file from disk.
    pub fn load(path: &Path) -> color_eyre::Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Serialize this config as TOML, for `emberd generate-config`.
    pub fn to_toml_string(&self) -> color_eyre::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn store_config(&self) -> ember_state::Config {
        ember_state::Config {
            cache_dir: self.data_dir.clone(),
        }
    }
}
