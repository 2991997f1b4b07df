//! Stateless and contextual block checks (spec.md §4.5), grounded on the
//! teacher's `zebra-consensus/src/block/check.rs`.

use std::collections::HashSet;

use ember_chain::block::Block;
use ember_chain::hash::Hash256;
use ember_chain::parameters::MAX_MONEY;
use ember_chain::work::difficulty::{CompactDifficulty, MAX_POW_TARGET, MIN_POW_TARGET};

use crate::error::{BlockError, TransactionError};
use crate::parameters::retarget;
use crate::transaction;

/// Exactly one coinbase transaction, and it is first (spec.md §3, §4.5).
pub fn coinbase_is_first(block: &Block) -> Result<(), BlockError> {
    let first = block.transactions.first().ok_or(BlockError::NoTransactions)?;
    if !first.is_coinbase() {
        return Err(BlockError::CoinbaseNotFirst);
    }
    if block.transactions[1..].iter().any(|tx| tx.contains_coinbase_input()) {
        return Err(BlockError::MultipleCoinbase);
    }
    Ok(())
}

/// No two transactions in the block share an identity hash (spec.md §4.5's
/// merkle-malleability defense-in-depth, kept alongside merkle_root_validity
/// per the teacher's own comment on why both checks exist).
pub fn no_duplicate_transactions(block: &Block, transaction_hashes: &[Hash256]) -> Result<(), BlockError> {
    let mut seen = HashSet::with_capacity(transaction_hashes.len());
    for (tx, hash) in block.transactions.iter().zip(transaction_hashes) {
        if !seen.insert(hash) {
            return Err(BlockError::DuplicateTransaction(tx.hash()));
        }
    }
    Ok(())
}

/// The computed merkle root over `transaction_hashes` matches the header's.
pub fn merkle_root_validity(block: &Block, transaction_hashes: &[Hash256]) -> Result<(), BlockError> {
    let merkle_root = ember_chain::block::merkle::root(transaction_hashes);
    if block.header.merkle_root != merkle_root {
        return Err(BlockError::BadMerkleRoot {
            expected: block.header.merkle_root,
            actual: merkle_root,
        });
    }
    Ok(())
}

/// `bits` decodes to a non-negative mantissa, sits within
/// `[MIN_POW_TARGET, MAX_POW_TARGET]`, and the block hash satisfies it
/// (spec.md §4.5: "PoW satisfies bits... bits within [MIN, MAX]").
pub fn difficulty_is_valid(block: &Block) -> Result<(), BlockError> {
    let header = &block.header;
    header
        .bits
        .to_expanded()
        .ok_or(BlockError::InvalidDifficulty(header.bits))?;

    if header.bits > MAX_POW_TARGET || header.bits < MIN_POW_TARGET {
        return Err(BlockError::TargetDifficultyLimit);
    }

    if !header.pow_is_valid() {
        return Err(BlockError::DifficultyFilter);
    }
    Ok(())
}

/// `timestamp <= now + MAX_TIMESTAMP_DRIFT` (spec.md §4.5, §6).
pub fn time_is_valid_at(block: &Block, now: u64, max_drift_secs: u64) -> Result<(), BlockError> {
    if !block.header.time_is_valid_at(now, max_drift_secs) {
        return Err(BlockError::TimeTooFarInFuture);
    }
    Ok(())
}

/// Sum of output values across the whole block stays within MAX_MONEY, and
/// no individual output exceeds it (spec.md §4.5).
pub fn outputs_within_max_money(block: &Block) -> Result<(), BlockError> {
    for tx in &block.transactions {
        transaction::check::outputs_within_max_money(tx)?;
    }
    let total: u128 = block
        .transactions
        .iter()
        .map(|tx| tx.output_sum() as u128)
        .sum();
    if total > MAX_MONEY as u128 {
        return Err(TransactionError::OutputSumExceedsMaxMoney(total.min(u64::MAX as u128) as u64).into());
    }
    Ok(())
}

/// `bits` matches the retarget schedule given the previous block's index
/// (spec.md §4.8): identical to the parent's `bits` except at retarget
/// boundaries.
pub fn retarget_is_valid(
    height: u32,
    bits: CompactDifficulty,
    prev_bits: CompactDifficulty,
    first_retarget_timestamp: Option<u64>,
    last_timestamp: Option<u64>,
) -> Result<(), BlockError> {
    let expected = retarget::next_work_required(height, prev_bits, first_retarget_timestamp, last_timestamp);
    if bits != expected {
        return Err(BlockError::BadRetarget {
            expected,
            actual: bits,
        });
    }
    Ok(())
}

/// Block timestamp strictly exceeds the median of the previous
/// `MEDIAN_TIME_WINDOW` timestamps (spec.md §4.5, §4.8).
pub fn timestamp_after_median(block_timestamp: u64, preceding_timestamps: &[u64]) -> Result<(), BlockError> {
    if preceding_timestamps.is_empty() {
        return Ok(());
    }
    let mut sorted = preceding_timestamps.to_vec();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2];
    if block_timestamp <= median {
        return Err(BlockError::TimestampNotAfterMedian);
    }
    Ok(())
}

/// A block's hash at a checkpointed height must match the checkpoint
/// (spec.md §4.8).
pub fn checkpoint_is_valid(height: u32, hash: Hash256, checkpoint: Option<Hash256>) -> Result<(), BlockError> {
    if let Some(expected) = checkpoint {
        if expected != hash {
            return Err(BlockError::CheckpointMismatch {
                height,
                expected,
                actual: hash,
            });
        }
    }
    Ok(())
}

/// Coinbase output total equals `subsidy(height) + fees`, no more
/// (spec.md §4.4, §4.5).
pub fn coinbase_reward_is_valid(block: &Block, subsidy: u64, fees: u64) -> Result<(), BlockError> {
    let actual = block.coinbase_output_sum().unwrap_or(0);
    let expected = subsidy.saturating_add(fees);
    if actual > expected {
        return Err(BlockError::BadCoinbaseReward { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ember_chain::parameters::genesis::genesis_block;
    use ember_chain::parameters::Network;

    use super::*;

    #[test]
    fn genesis_passes_stateless_checks() {
        let block = genesis_block(Network::Mainnet);
        coinbase_is_first(&block).unwrap();
        let hashes: Vec<_> = block.transactions.iter().map(|tx| tx.hash()).collect();
        merkle_root_validity(&block, &hashes).unwrap();
        no_duplicate_transactions(&block, &hashes).unwrap();
        difficulty_is_valid(&block).unwrap();
        outputs_within_max_money(&block).unwrap();
    }

    #[test]
    fn empty_block_has_no_transactions() {
        let mut block = genesis_block(Network::Mainnet);
        block.transactions.clear();
        assert_eq!(coinbase_is_first(&block), Err(BlockError::NoTransactions));
    }

    #[test]
    fn timestamp_must_exceed_median() {
        assert!(timestamp_after_median(100, &[90, 95, 99]).is_ok());
        assert_eq!(
            timestamp_after_median(95, &[90, 95, 99]),
            Err(BlockError::TimestampNotAfterMedian)
        );
    }

    #[test]
    fn checkpoint_mismatch_is_rejected() {
        let hash = Hash256::of(b"wrong");
        let expected = Hash256::of(b"right");
        assert_eq!(
            checkpoint_is_valid(100, hash, Some(expected)),
            Err(BlockError::CheckpointMismatch {
                height: 100,
                expected,
                actual: hash,
            })
        );
        assert!(checkpoint_is_valid(100, hash, None).is_ok());
    }

    #[test]
    fn coinbase_reward_over_subsidy_plus_fees_is_rejected() {
        let block = genesis_block(Network::Mainnet);
        let subsidy = block.coinbase_output_sum().unwrap();
        assert!(coinbase_reward_is_valid(&block, subsidy, 0).is_ok());
        assert!(matches!(
            coinbase_reward_is_valid(&block, subsidy - 1, 0),
            Err(BlockError::BadCoinbaseReward { .. })
        ));
    }
}
