//! Blocks: a header plus an ordered transaction list (spec.md §3).

pub mod header;
pub mod merkle;

pub use header::Header;

use ember_codec_derive::{Decode, Encode};
#[cfg(any(test, feature = "proptest-impl"))]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Decode, Encode};
use crate::hash::Hash256;
use crate::transaction::Transaction;

/// A block height. Height 0 is genesis.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct Height(pub u32);

/// A block: a header and the transactions it commits to via
/// `header.merkle_root` (spec.md §3). Invariants enforced by the validator,
/// not by this type: non-empty, `transactions[0]` is coinbase, no other tx
/// is coinbase, merkle root matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn is_coinbase_first(&self) -> bool {
        matches!(self.transactions.first(), Some(tx) if tx.is_coinbase())
    }

    pub fn has_single_coinbase(&self) -> bool {
        self.transactions.iter().filter(|tx| tx.is_coinbase()).count() == 1
    }

    /// The Merkle root of this block's transactions, as it should appear
    /// in `header.merkle_root`.
    pub fn computed_merkle_root(&self) -> Hash256 {
        let leaves: Vec<Hash256> = self.transactions.iter().map(Transaction::hash).collect();
        merkle::root(&leaves)
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    /// Sum of coinbase output values; used by `BadCoinbaseReward` checks.
    pub fn coinbase_output_sum(&self) -> Option<u64> {
        self.coinbase().map(Transaction::output_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transparent::{OutPoint, TxInput, TxOutput};
    use crate::work::difficulty::MAX_POW_TARGET;

    fn coinbase_tx() -> Transaction {
        Transaction::new(
            1,
            vec![TxInput {
                prev: OutPoint::coinbase_sentinel(),
                witness: vec![1],
                signature: vec![],
                sequence: 0xFFFF_FFFF,
            }],
            vec![TxOutput {
                value: 5_000_000_000,
                script_pubkey: vec![],
                recipient_pubkey: vec![0xAB; 32],
            }],
            0,
            1_700_000_000,
        )
    }

    #[test]
    fn single_coinbase_first_block_passes_structural_checks() {
        let tx = coinbase_tx();
        let root = merkle::root(&[tx.hash()]);
        let header = Header::new(1, Hash256::zero(), root, 1_700_000_000, MAX_POW_TARGET, 0);
        let block = Block {
            header,
            transactions: vec![tx],
        };
        assert!(block.is_coinbase_first());
        assert!(block.has_single_coinbase());
        assert_eq!(block.computed_merkle_root(), block.header.merkle_root);
    }

    #[test]
    fn second_coinbase_fails_single_coinbase_check() {
        let mut block_txs = vec![coinbase_tx(), coinbase_tx()];
        block_txs[1].cache_hash(Hash256::of(b"distinguish"));
        let block = Block {
            header: Header::new(
                1,
                Hash256::zero(),
                Hash256::zero(),
                0,
                MAX_POW_TARGET,
                0,
            ),
            transactions: block_txs,
        };
        assert!(!block.has_single_coinbase());
    }
}
