use std::collections::{BTreeSet, HashMap, HashSet};

use ember_chain::block::Block;
use ember_chain::hash::Hash256;
use ember_chain::parameters::{MAX_MEMPOOL_SIZE, MAX_TX_SIZE, MIN_RELAY_FEE_RATE};
use ember_chain::transaction::Transaction;
use ember_chain::transparent::OutPoint;
use tracing::trace;

use crate::entry::{Entry, FeeRateKey};
use crate::error::MempoolError;

/// Entries older than this are dropped by [`Mempool::expire`] (spec.md
/// §4.6); not a cross-network consensus constant, so it lives here rather
/// than in `ember_chain::parameters`.
pub const MAX_AGE_SECS: u64 = 72 * 60 * 60;

/// The fee-prioritized pool of transactions awaiting confirmation.
///
/// Not thread-safe on its own — callers share one instance behind a
/// `Mutex`, the way `emberd::Node` does (spec.md §5: "single writer").
pub struct Mempool {
    by_hash: HashMap<Hash256, Entry>,
    by_outpoint: HashMap<OutPoint, Hash256>,
    by_fee_rate: BTreeSet<FeeRateKey>,
    cached_total_bytes: usize,
    max_bytes: usize,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new(MAX_MEMPOOL_SIZE)
    }
}

impl Mempool {
    pub fn new(max_bytes: usize) -> Self {
        Mempool {
            by_hash: HashMap::new(),
            by_outpoint: HashMap::new(),
            by_fee_rate: BTreeSet::new(),
            cached_total_bytes: 0,
            max_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.cached_total_bytes
    }

    pub fn has(&self, txid: &Hash256) -> bool {
        self.by_hash.contains_key(txid)
    }

    pub fn get(&self, txid: &Hash256) -> Option<&Entry> {
        self.by_hash.get(txid)
    }

    /// Admit `tx`, added at `time_added` and weighing `fee` (computed by the
    /// caller against the current UTXO view — the mempool itself has no
    /// view and cannot compute fees). Implements spec.md §4.6's six-step
    /// admission algorithm.
    pub fn insert(
        &mut self,
        tx: Transaction,
        fee: u64,
        time_added: u64,
    ) -> Result<Hash256, MempoolError> {
        let txid = tx.hash();

        // 1. Reject if already present.
        if self.has(&txid) {
            return Err(MempoolError::AlreadyPresent(txid));
        }

        // 2. Stateless shape: non-coinbase, no dust outputs, size limit.
        if tx.is_coinbase() {
            return Err(MempoolError::Coinbase);
        }
        if tx.outputs.iter().any(|o| o.is_dust()) {
            return Err(MempoolError::DustOutput);
        }
        let size = tx.len();
        if size > MAX_TX_SIZE {
            return Err(MempoolError::TooLarge {
                size,
                max: MAX_TX_SIZE,
            });
        }

        // 3. Minimum fee rate.
        let rate = fee / size.max(1) as u64;
        if rate < MIN_RELAY_FEE_RATE {
            return Err(MempoolError::FeeTooLow {
                fee_rate: rate,
                minimum: MIN_RELAY_FEE_RATE,
            });
        }

        // 4. Conflict check against already-pooled spends.
        for input in &tx.inputs {
            if let Some(existing) = self.by_outpoint.get(&input.prev) {
                if *existing != txid {
                    return Err(MempoolError::Conflict(input.prev, *existing));
                }
            }
        }

        let candidate = FeeRateKey {
            fee,
            size,
            time_added,
            txid,
        };

        // 5. Free space by evicting from the low-fee-rate end, if needed.
        // `by_fee_rate` is ascending, so the first entry whose rate is not
        // strictly below the candidate's ends the eligible run.
        if self.cached_total_bytes + size > self.max_bytes {
            let mut freed = 0usize;
            let mut to_evict = Vec::new();
            for key in self.by_fee_rate.iter() {
                if !key.rate_less_than(&candidate) {
                    break;
                }
                freed += self.by_hash.get(&key.txid).map(|e| e.size).unwrap_or(0);
                to_evict.push(key.txid);
                if self.cached_total_bytes + size - freed <= self.max_bytes {
                    break;
                }
            }
            if self.cached_total_bytes + size - freed > self.max_bytes {
                return Err(MempoolError::Full);
            }
            for txid in to_evict {
                self.remove(&txid);
            }
        }

        // 6. Insert into all three indexes.
        for input in &tx.inputs {
            self.by_outpoint.insert(input.prev, txid);
        }
        self.by_fee_rate.insert(candidate);
        self.cached_total_bytes += size;
        self.by_hash.insert(
            txid,
            Entry {
                tx,
                txid,
                fee,
                size,
                time_added,
            },
        );

        trace!(%txid, fee, size, "admitted transaction to mempool");
        Ok(txid)
    }

    /// Remove a transaction (and its outpoint/fee-rate index entries),
    /// returning it if present.
    pub fn remove(&mut self, txid: &Hash256) -> Option<Entry> {
        let entry = self.by_hash.remove(txid)?;
        for input in &entry.tx.inputs {
            self.by_outpoint.remove(&input.prev);
        }
        self.by_fee_rate.remove(&FeeRateKey::of(&entry));
        self.cached_total_bytes -= entry.size;
        Some(entry)
    }

    /// Drop every transaction a newly-connected block confirms (spec.md
    /// §4.6: "Block-confirmation removal").
    pub fn remove_confirmed(&mut self, block: &Block) {
        for tx in &block.transactions {
            self.remove(&tx.hash());
        }
    }

    /// Periodic sweep dropping entries older than [`MAX_AGE_SECS`]
    /// (spec.md §4.6 "Expiration").
    pub fn expire(&mut self, now: u64) -> Vec<Hash256> {
        let stale: Vec<Hash256> = self
            .by_hash
            .values()
            .filter(|e| now.saturating_sub(e.time_added) > MAX_AGE_SECS)
            .map(|e| e.txid)
            .collect();
        for txid in &stale {
            self.remove(txid);
        }
        stale
    }

    /// Greedily fill a block template from the fee-rate-descending end,
    /// skipping any entry too large for the remaining budget (spec.md
    /// §4.6: "Mining template").
    pub fn get_for_block(&self, max_count: usize, max_size: usize) -> Vec<&Entry> {
        let mut selected = Vec::new();
        let mut remaining = max_size;
        for key in self.by_fee_rate.iter().rev() {
            if selected.len() >= max_count {
                break;
            }
            if let Some(entry) = self.by_hash.get(&key.txid) {
                if entry.size <= remaining {
                    remaining -= entry.size;
                    selected.push(entry);
                }
            }
        }
        selected
    }

    /// Mempool entries whose inputs spend an output of `txid` (spec.md
    /// §4.6: "Dependency query").
    pub fn dependencies(&self, txid: &Hash256) -> Vec<&Entry> {
        let mut seen = HashSet::new();
        self.by_hash
            .values()
            .filter(|e| {
                e.tx
                    .inputs
                    .iter()
                    .any(|input| input.prev.tx_hash == *txid)
                    && seen.insert(e.txid)
            })
            .collect()
    }
}
