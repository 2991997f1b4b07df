//! Hard-coded height/hash checkpoints a chain must pass through (spec.md
//! §4.8: "a compile-time ordered map height -> hash").
//!
//! This is a freshly-launched chain with no history to bake in yet, so
//! both tables are empty; `checkpoint_at` is the hook `ChainManager`'s
//! reorg-depth and side-chain acceptance logic calls regardless, and entries
//! land here the way Bitcoin Core's `chainparams.cpp` accumulates them as a
//! chain matures.

use crate::hash::Hash256;
use crate::parameters::Network;

const MAINNET_CHECKPOINTS: &[(u32, Hash256)] = &[];
const TESTNET_CHECKPOINTS: &[(u32, Hash256)] = &[];

/// The hash a block at `height` must have, if `height` is checkpointed.
pub fn checkpoint_at(network: Network, height: u32) -> Option<Hash256> {
    let table = match network {
        Network::Mainnet => MAINNET_CHECKPOINTS,
        Network::Testnet => TESTNET_CHECKPOINTS,
    };
    table.iter().find(|(h, _)| *h == height).map(|(_, hash)| *hash)
}
