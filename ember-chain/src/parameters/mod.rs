//! Consensus constants shared by every participant (spec.md §4.8, §6).
//!
//! These MUST match across all participants; a codec or network mismatch
//! here is a hard fork.

pub mod checkpoints;
pub mod genesis;

/// Which network a node is configured for. Testnet exists so integration
/// tests and local mining don't fight mainnet's proof-of-work target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(proptest_derive::Arbitrary))]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn genesis_hash(self) -> crate::hash::Hash256 {
        genesis::genesis_block(self).hash()
    }
}

/// Base units per coin (1 INT = 100,000,000 base units).
pub const COIN: u64 = 100_000_000;

/// Block subsidy at height 0 (spec.md §4.8: `subsidy(h) = INITIAL_REWARD >>
/// (h / HALVING_INTERVAL)`).
pub const INITIAL_REWARD: u64 = 50 * COIN;

/// Halving period, in blocks.
pub const HALVING_INTERVAL: u32 = 210_000;

/// Target seconds between blocks.
pub const TARGET_SPACING: u64 = 120;

/// Blocks between difficulty retargets (spec.md §4.8).
pub const RETARGET_INTERVAL: u32 = 2016;

/// Supply cap, in base units (spec.md §4.5: "output values <= MAX_MONEY
/// (21e14 base units)").
pub const MAX_MONEY: u64 = 2_100_000_000_000_000;

/// Blocks a coinbase output must wait before it is spendable (spec.md §3).
pub const COINBASE_MATURITY: u32 = 100;

/// Maximum serialized block size, in bytes.
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024;

/// Maximum blocks a reorg may disconnect before being rejected (spec.md §4.7).
pub const MAX_REORG_DEPTH: u32 = 100;

/// Non-coinbase outputs below this value are rejected from the mempool
/// (spec.md §3).
pub const DUST_THRESHOLD: u64 = 1000;

/// Minimum accepted fee rate, in base units per byte (spec.md §4.6).
pub const MIN_RELAY_FEE_RATE: u64 = 1;

/// Mempool memory cap, in bytes (spec.md §4.6; overridable for tests).
pub const MAX_MEMPOOL_SIZE: usize = 300 * 1024 * 1024;

/// Maximum serialized transaction size, in bytes (spec.md §4.6).
pub const MAX_TX_SIZE: usize = 100 * 1024;

/// Maximum seconds a block's timestamp may sit ahead of the local clock
/// (spec.md §4.5: "timestamp <= now + 2 hours").
pub const MAX_TIMESTAMP_DRIFT: u64 = 2 * 60 * 60;

/// Number of preceding blocks' timestamps used to compute the median-time
/// floor a new block's timestamp must exceed (spec.md §4.5's
/// `TimestampNotAfterMedian`).
pub const MEDIAN_TIME_WINDOW: usize = 11;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_money_matches_spec_value() {
        assert_eq!(MAX_MONEY, 2_100_000_000_000_000);
    }

    #[test]
    fn initial_reward_and_halving_fit_under_max_money() {
        // sum_{i=0}^{inf} INITIAL_REWARD * HALVING_INTERVAL / 2^i converges
        // to roughly 2 * INITIAL_REWARD * HALVING_INTERVAL, matching the
        // Bitcoin-style 21M supply cap this design reuses.
        let total = 2u128 * INITIAL_REWARD as u128 * HALVING_INTERVAL as u128;
        assert!(total <= MAX_MONEY as u128);
    }
}
