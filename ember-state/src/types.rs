//! Values stored alongside blocks: per-block index entries, UTXO entries,
//! and the single chain-tip summary (spec.md §3, §4.3).

use ember_chain::codec::{CodecError, Decode, Encode};
use ember_chain::hash::Hash256;
use ember_chain::transparent::{OutPoint, TxOutput};
use ember_codec_derive::{Decode, Encode};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Per-block metadata kept alongside the block itself, enough to walk the
/// chain backward and to recompute/verify accumulated work without
/// re-reading every block body (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BlockIndex {
    pub hash: Hash256,
    pub prev_hash: Hash256,
    pub height: u32,
    pub timestamp: u64,
    pub bits: ember_chain::work::difficulty::CompactDifficulty,
    pub tx_count: u32,
    pub chain_work: U256,
    pub file_pos: u64,
}

/// A single unspent output, plus the metadata needed to enforce coinbase
/// maturity (spec.md §3, §4.4).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct UtxoEntry {
    pub output: TxOutput,
    pub height: u32,
    pub is_coinbase: bool,
}

impl UtxoEntry {
    pub fn is_mature(&self, current_height: u32, coinbase_maturity: u32) -> bool {
        if !self.is_coinbase {
            return true;
        }
        current_height.saturating_sub(self.height) >= coinbase_maturity
    }
}

/// One output a block's application removed from the UTXO set, paired with
/// the entry as it read before removal — what `undo` needs to put it back
/// (spec.md §4.4, §4.7; resolves `original_source`'s "TODO: add back spent
/// outputs" by persisting the pre-image rather than a bare outpoint).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct UndoEntry {
    pub outpoint: OutPoint,
    pub entry: UtxoEntry,
}

/// A block's full effect on the UTXO set, persisted under `UNDO/<hash>` so
/// a later reorg can disconnect it without the original entries still being
/// live in the UTXO set (spec.md §4.7's reorg disconnect walk).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct UndoData {
    pub spent: Vec<UndoEntry>,
    pub created: Vec<OutPoint>,
}

/// Where a transaction lives: which block, and its index within that
/// block's transaction list (spec.md §4.3: `TX/<txhash> -> (block_hash,
/// offset)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TxLocation {
    pub block_hash: Hash256,
    pub offset: u32,
}

/// The single chain-tip summary; exactly one instance exists at any time,
/// updated atomically with the batch that produces a new tip (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ChainState {
    pub best_hash: Hash256,
    pub best_height: u32,
    pub chain_work: U256,
    pub total_transactions: u64,
    pub utxo_count: u64,
    pub total_supply: u64,
}

impl ChainState {
    pub fn genesis(genesis_hash: Hash256, genesis_subsidy: u64) -> Self {
        ChainState {
            best_hash: genesis_hash,
            best_height: 0,
            chain_work: U256::zero(),
            total_transactions: 1,
            utxo_count: 1,
            total_supply: genesis_subsidy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_index_roundtrips() {
        let index = BlockIndex {
            hash: Hash256::of(b"block"),
            prev_hash: Hash256::zero(),
            height: 7,
            timestamp: 1_700_000_000,
            bits: ember_chain::work::difficulty::CompactDifficulty(0x1d00_ffff),
            tx_count: 3,
            chain_work: U256::from(12345u64),
            file_pos: 0,
        };
        let bytes = index.encode_to_vec();
        let back: BlockIndex = ember_chain::codec::decode_exact(&bytes).unwrap();
        assert_eq!(index, back);
    }

    #[test]
    fn utxo_maturity() {
        let entry = UtxoEntry {
            output: TxOutput {
                value: 100,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            },
            height: 10,
            is_coinbase: true,
        };
        assert!(!entry.is_mature(50, 100));
        assert!(entry.is_mature(110, 100));
        assert!(entry.is_mature(200, 100));
    }

    #[test]
    fn non_coinbase_always_mature() {
        let entry = UtxoEntry {
            output: TxOutput {
                value: 100,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            },
            height: 10,
            is_coinbase: false,
        };
        assert!(entry.is_mature(10, 100));
    }
}
