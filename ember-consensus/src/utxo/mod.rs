//! The UTXO engine (spec.md §4.4): `apply`/`undo` a block's effect on the
//! UTXO set within a single store batch.
//!
//! This is new code relative to the teacher: the `zebra-state` slice in the
//! pack doesn't include zebra's real UTXO-contextual-validation crate, so
//! this is grounded directly on spec.md §4.4 and the intcoin
//! `update_utxo_set`/`verify_transaction` pair
//! (`original_source/src/core/blockchain.cpp`), resolving that original's
//! open "TODO: add back spent outputs" by having `Diff` record the spent
//! entry itself (not just the outpoint), so `undo` doesn't need a second
//! lookup.

use ember_chain::block::Block;
use ember_chain::crypto::address;
use ember_chain::transparent::OutPoint;
use ember_state::types::{UndoData, UndoEntry, UtxoEntry};
use ember_state::{Batch, Store, StoreError};

/// Reads the current (pre-this-block) UTXO set. Implemented for the store
/// directly, and for a store/batch pair so a block's later transactions
/// can see the earlier ones' outputs before the batch commits.
pub trait UtxoLookup {
    fn lookup(&self, outpoint: &OutPoint) -> Option<UtxoEntry>;
}

impl UtxoLookup for Store {
    fn lookup(&self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        self.get_utxo(outpoint).ok().flatten()
    }
}

/// A view combining the store's committed state with a batch's staged
/// writes, so `apply` can read outputs created earlier in the same block.
pub struct BatchView<'a> {
    pub store: &'a Store,
    pub batch: &'a Batch,
}

impl<'a> UtxoLookup for BatchView<'a> {
    fn lookup(&self, outpoint: &OutPoint) -> Option<UtxoEntry> {
        // `staged_utxo` distinguishes "never staged" (`None`, fall through to
        // the committed store) from "staged as deleted" (`Some(None)`, a
        // same-block spend that must not resolve against the pre-batch
        // store); collapsing the two would let a second transaction in this
        // block spend an outpoint a preceding one already spent.
        match self.batch.staged_utxo(outpoint) {
            Some(staged) => staged.cloned(),
            None => self.store.lookup(outpoint),
        }
    }
}

/// The effect a block's application had on the UTXO set, sufficient to
/// undo it exactly (spec.md §4.4, §4.7).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Outpoints removed, with the entry as it existed before removal.
    pub spent: Vec<(OutPoint, UtxoEntry)>,
    /// Outpoints newly created.
    pub created: Vec<OutPoint>,
    /// Total fees collected across all non-coinbase transactions.
    pub total_fees: u64,
}

/// Apply every transaction in `block` to the UTXO set, staging the writes
/// into `batch`. The coinbase transaction's inputs are not resolved (it has
/// none); every other transaction's inputs are removed from the view and
/// its outputs are inserted, in transaction order (spec.md §4.4).
///
/// Does not itself validate inputs exist, coinbase maturity, signatures, or
/// the coinbase reward total — those are `ember_consensus::transaction` and
/// `ember_consensus::block` checks run beforehand against the same view;
/// `apply` assumes the block has already passed them and focuses purely on
/// bookkeeping the set transition.
pub fn apply(block: &Block, height: u32, store: &Store, batch: &mut Batch) -> Result<Diff, StoreError> {
    let mut diff = Diff::default();

    for (tx_index, tx) in block.transactions.iter().enumerate() {
        let is_coinbase = tx_index == 0;

        if !is_coinbase {
            let mut spent_sum = 0u64;
            for input in &tx.inputs {
                let view = BatchView { store, batch };
                let entry = view
                    .lookup(&input.prev)
                    .ok_or(StoreError::MissingUtxo(input.prev))?;
                spent_sum += entry.output.value;
                let addr = address(&entry.output.recipient_pubkey);
                batch.del_utxo(input.prev, Some(&addr));
                diff.spent.push((input.prev, entry));
            }
            diff.total_fees = diff
                .total_fees
                .saturating_add(spent_sum.saturating_sub(tx.output_sum()));
        }

        let txid = tx.hash();
        for (output_index, output) in tx.outputs.iter().enumerate() {
            let outpoint = OutPoint {
                tx_hash: txid,
                index: output_index as u32,
            };
            let entry = UtxoEntry {
                output: output.clone(),
                height,
                is_coinbase,
            };
            let addr = address(&output.recipient_pubkey);
            batch.put_utxo(outpoint, entry, Some(&addr));
            diff.created.push(outpoint);
        }
        batch.record_tx(block.hash(), txid, tx_index as u32);
    }

    Ok(diff)
}

impl From<&Diff> for UndoData {
    /// The durable form of a `Diff`, persisted under `UNDO/<hash>` so a
    /// reorg can disconnect this block after the set of `spent` entries it
    /// recorded is no longer otherwise recoverable from the live UTXO set
    /// (spec.md §4.7).
    fn from(diff: &Diff) -> Self {
        UndoData {
            spent: diff
                .spent
                .iter()
                .map(|(outpoint, entry)| UndoEntry {
                    outpoint: *outpoint,
                    entry: entry.clone(),
                })
                .collect(),
            created: diff.created.clone(),
        }
    }
}

impl From<UndoData> for Diff {
    fn from(undo: UndoData) -> Self {
        Diff {
            spent: undo
                .spent
                .into_iter()
                .map(|entry| (entry.outpoint, entry.entry))
                .collect(),
            created: undo.created,
            total_fees: 0,
        }
    }
}

/// Reverse a previously-applied block's effect on the UTXO set: remove
/// every output it created and reinsert every entry it spent (spec.md
/// §4.4, §4.7). `store` is consulted (not yet mutated) to recover each
/// created output's address, so its `ADDR/` reverse-index entry is cleaned
/// up in lock-step rather than left dangling.
pub fn undo(diff: &Diff, store: &Store, batch: &mut Batch) -> Result<(), StoreError> {
    for outpoint in &diff.created {
        let addr = store
            .get_utxo(outpoint)?
            .map(|entry| address(&entry.output.recipient_pubkey));
        batch.del_utxo(*outpoint, addr.as_deref());
    }
    for (outpoint, entry) in diff.spent.iter().rev() {
        let addr = address(&entry.output.recipient_pubkey);
        batch.put_utxo(*outpoint, entry.clone(), Some(&addr));
    }
    Ok(())
}
