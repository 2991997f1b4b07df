//! The genesis block for each network (spec.md §3's "walk back via
//! `prev_hash`... all the way back to the genesis block").

use crate::block::{Block, Header};
use crate::hash::Hash256;
use crate::parameters::Network;
use crate::transaction::Transaction;
use crate::transparent::{OutPoint, TxInput, TxOutput};
use crate::work::difficulty::MAX_POW_TARGET;

use super::INITIAL_REWARD;

const MAINNET_TIMESTAMP: u64 = 1_700_000_000;
const TESTNET_TIMESTAMP: u64 = 1_700_000_000;

fn coinbase_message(network: Network) -> &'static [u8] {
    match network {
        Network::Mainnet => b"ember genesis mainnet",
        Network::Testnet => b"ember genesis testnet",
    }
}

fn genesis_coinbase(network: Network) -> Transaction {
    Transaction::new(
        1,
        vec![TxInput {
            prev: OutPoint::coinbase_sentinel(),
            witness: coinbase_message(network).to_vec(),
            signature: vec![],
            sequence: 0xFFFF_FFFF,
        }],
        vec![TxOutput {
            value: INITIAL_REWARD,
            script_pubkey: vec![],
            recipient_pubkey: vec![],
        }],
        0,
        match network {
            Network::Mainnet => MAINNET_TIMESTAMP,
            Network::Testnet => TESTNET_TIMESTAMP,
        },
    )
}

/// Construct the genesis block for `network`. Its hash is stable for a
/// given network (deterministic inputs), so callers needing the genesis
/// hash alone should prefer `Network::genesis_hash`.
///
/// The genesis block is consensus-valid like any other: its nonce is
/// ground against `MAX_POW_TARGET` (the easiest target) rather than
/// fixed at 0, since the header's own hash is not guaranteed to satisfy
/// an arbitrary nonce.
pub fn genesis_block(network: Network) -> Block {
    let coinbase = genesis_coinbase(network);
    let merkle_root = crate::block::merkle::root(&[coinbase.hash()]);
    let timestamp = match network {
        Network::Mainnet => MAINNET_TIMESTAMP,
        Network::Testnet => TESTNET_TIMESTAMP,
    };
    let mut header = Header::new(1, Hash256::zero(), merkle_root, timestamp, MAX_POW_TARGET, 0);
    let mut nonce = 0u64;
    while !header.pow_is_valid() {
        nonce += 1;
        assert!(nonce < 1_000, "MAX_POW_TARGET is no longer genesis-easy");
        header = Header::new(1, Hash256::zero(), merkle_root, timestamp, MAX_POW_TARGET, nonce);
    }
    Block {
        header,
        transactions: vec![coinbase],
    }
}
