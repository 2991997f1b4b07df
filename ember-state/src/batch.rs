//! A single all-or-nothing multi-key write (spec.md §4.3, §5, §7).
//!
//! `sled::Batch` itself is write-only — it cannot be read back before
//! `commit`. Consensus logic (`ember-consensus`'s UTXO engine) needs to read
//! its own writes within one block's application before the batch
//! commits, so `Batch` layers a small in-memory staging map for UTXO
//! entries on top of the underlying `sled::Batch`; every other namespace
//! (`BLOCK`/`INDEX`/`HEIGHT`/`STATE`) is write-only within a batch, which
//! matches how those namespaces are actually used (each key is written at
//! most once per batch).

use std::collections::HashMap;

use ember_chain::block::Block;
use ember_chain::codec::{encode_persisted, Encode, PersistedHeader};
use ember_chain::hash::Hash256;
use ember_chain::transparent::OutPoint;

use crate::keys;
use crate::types::{BlockIndex, ChainState, TxLocation, UndoData, UtxoEntry};

pub(crate) const BLOCK_HEADER: PersistedHeader = PersistedHeader::new(*b"BLK", 1);
pub(crate) const INDEX_HEADER: PersistedHeader = PersistedHeader::new(*b"IDX", 1);
pub(crate) const UTXO_HEADER: PersistedHeader = PersistedHeader::new(*b"UTX", 1);
pub(crate) const STATE_HEADER: PersistedHeader = PersistedHeader::new(*b"STT", 1);
pub(crate) const UNDO_HEADER: PersistedHeader = PersistedHeader::new(*b"UND", 1);

/// A staged set of writes, applied to the store atomically by `commit`.
pub struct Batch {
    pub(crate) sled_batch: sled::Batch,
    /// Shadows pending UTXO writes so a single block application can read
    /// outputs it just created before the batch actually commits.
    pub(crate) staged_utxos: HashMap<OutPoint, Option<UtxoEntry>>,
}

impl Batch {
    pub fn new() -> Self {
        Batch {
            sled_batch: sled::Batch::default(),
            staged_utxos: HashMap::new(),
        }
    }

    pub fn put_block(&mut self, block: &Block) {
        let hash = block.hash();
        let bytes = encode_persisted(BLOCK_HEADER, block);
        self.sled_batch.insert(keys::block(&hash), bytes);
    }

    /// Persist `index` under `INDEX/<hash>`. Every accepted block gets an
    /// index entry regardless of whether it ends up on the main chain, so a
    /// later reorg can walk a side chain's `prev_hash` links; the
    /// height->hash pointer is a separate, main-chain-only fact set by
    /// `put_height` (spec.md §4.7: a side chain must not clobber the main
    /// chain's `HEIGHT/` entry for blocks it shares a height range with).
    pub fn put_index(&mut self, index: &BlockIndex) {
        let bytes = encode_persisted(INDEX_HEADER, index);
        self.sled_batch.insert(keys::index(&index.hash), bytes);
    }

    /// Record that `hash` is the main chain's block at `height`. Called only
    /// when a block is connected (extended onto, or reorged onto, the tip).
    pub fn put_height(&mut self, height: u32, hash: Hash256) {
        self.sled_batch.insert(keys::height(height), hash.as_bytes().to_vec());
    }

    pub fn put_utxo(&mut self, outpoint: OutPoint, entry: UtxoEntry, address: Option<&str>) {
        let bytes = encode_persisted(UTXO_HEADER, &entry);
        self.sled_batch.insert(keys::utxo(&outpoint), bytes);
        if let Some(address) = address {
            self.sled_batch.insert(keys::addr(address, &outpoint), vec![]);
        }
        self.staged_utxos.insert(outpoint, Some(entry));
    }

    pub fn del_utxo(&mut self, outpoint: OutPoint, address: Option<&str>) {
        self.sled_batch.remove(keys::utxo(&outpoint));
        if let Some(address) = address {
            self.sled_batch.remove(keys::addr(address, &outpoint));
        }
        self.staged_utxos.insert(outpoint, None);
    }

    pub fn put_undo(&mut self, block_hash: &Hash256, undo: &UndoData) {
        let bytes = encode_persisted(UNDO_HEADER, undo);
        self.sled_batch.insert(keys::undo(block_hash), bytes);
    }

    pub fn put_tip(&mut self, state: &ChainState) {
        let bytes = encode_persisted(STATE_HEADER, state);
        self.sled_batch.insert(keys::STATE_TIP, bytes);
    }

    /// A UTXO entry as it would read *after* this batch applies, without
    /// needing the batch to have committed yet. `None` means this outpoint
    /// has no staged write at all; `Some(None)` means it was staged as
    /// deleted by `del_utxo` and must not fall through to the committed
    /// store — callers that collapse the two lose a same-block double-spend
    /// (a later transaction reading an outpoint an earlier one just spent).
    pub fn staged_utxo(&self, outpoint: &OutPoint) -> Option<Option<&UtxoEntry>> {
        self.staged_utxos.get(outpoint).map(|v| v.as_ref())
    }

    pub fn record_tx(&mut self, block_hash: Hash256, txid: Hash256, offset: u32) {
        let location = TxLocation { block_hash, offset };
        self.sled_batch.insert(keys::tx(&txid), location.encode_to_vec());
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}
