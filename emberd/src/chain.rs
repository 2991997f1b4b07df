//! The chain manager (spec.md §4.7): owns block acceptance, extending the
//! tip, planning and executing reorgs, and parking orphans. New code — the
//! pack's `zebra-state` doesn't ship this slice — grounded directly on
//! spec.md §4.7's extend/reorg/side-chain/orphan algorithm and on
//! `ember-consensus`'s validation primitives, composed the way the teacher
//! composes `zebra-consensus` checks around `zebra-state`.

use std::collections::HashMap;
use std::sync::Mutex;

use ember_chain::block::Block;
use ember_chain::hash::Hash256;
use ember_chain::parameters::{
    self, checkpoints, Network, COINBASE_MATURITY, MAX_REORG_DEPTH, MAX_TIMESTAMP_DRIFT, MEDIAN_TIME_WINDOW,
};
use ember_consensus::parameters::{retarget, subsidy};
use ember_consensus::utxo::{self, Diff};
use ember_consensus::{block::check as block_check, signatures, transaction::check as transaction_check};
use ember_state::types::{BlockIndex, ChainState, UndoData};
use ember_state::{Batch, Store};
use tracing::{info, warn};

use crate::error::NodeError;

/// The outcome of submitting one block, distinguishing the cases the
/// caller (`Node`, and in turn the mempool) must react to differently.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Already known; nothing changed.
    Duplicate,
    /// Valid but its parent hasn't arrived yet; held in memory.
    Orphan,
    /// Stored, but its branch has less work than the current tip.
    SideChain { height: u32 },
    /// Connected directly onto the previous tip.
    Extended { block: Block, height: u32 },
    /// A side chain overtook the previous tip; `disconnected` and
    /// `connected` are each in chain order (oldest first).
    Reorged {
        height: u32,
        disconnected: Vec<Block>,
        connected: Vec<Block>,
    },
}

/// Serializes block submission so only one extend-or-reorg proceeds at a
/// time (spec.md §5); held for a whole `submit_block` call, including
/// orphan re-processing, which is the simplest faithful reading of "a
/// mutex serializes submit_block calls" given this core has no concurrent
/// network I/O driving it.
pub struct ChainManager {
    store: Store,
    network: Network,
    tip_lock: Mutex<()>,
    orphans: Mutex<HashMap<Hash256, Vec<Block>>>,
}

impl ChainManager {
    pub fn new(store: Store, network: Network) -> Self {
        ChainManager {
            store,
            network,
            tip_lock: Mutex::new(()),
            orphans: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The `bits` a block at `height` extending `parent` must carry
    /// (spec.md §4.8); exposed so `build_block_template` and the extend
    /// path agree on the same retarget computation.
    pub fn expected_bits(&self, height: u32, parent: &BlockIndex) -> Result<ember_chain::work::difficulty::CompactDifficulty, NodeError> {
        let (first_ts, last_ts) = self.retarget_window(height, parent)?;
        Ok(retarget::next_work_required(height, parent.bits, first_ts, last_ts))
    }

    /// Genesis's chain state, used the first time a store is opened.
    pub fn ensure_genesis(&self) -> Result<(), NodeError> {
        if self.store.get_tip()?.is_some() {
            return Ok(());
        }
        let genesis = ember_chain::parameters::genesis::genesis_block(self.network);
        let mut batch = self.store.begin_batch();
        let diff = utxo::apply(&genesis, 0, &self.store, &mut batch)?;
        batch.put_undo(&genesis.hash(), &UndoData::from(&diff));
        batch.put_block(&genesis);
        batch.put_index(&BlockIndex {
            hash: genesis.hash(),
            prev_hash: Hash256::zero(),
            height: 0,
            timestamp: genesis.header.timestamp,
            bits: genesis.header.bits,
            tx_count: genesis.transactions.len() as u32,
            chain_work: genesis.header.bits.to_work(),
            file_pos: 0,
        });
        batch.put_height(0, genesis.hash());
        batch.put_tip(&ChainState {
            best_hash: genesis.hash(),
            best_height: 0,
            chain_work: genesis.header.bits.to_work(),
            total_transactions: genesis.transactions.len() as u64,
            utxo_count: diff.created.len() as u64,
            total_supply: genesis.coinbase_output_sum().unwrap_or(0),
        });
        self.store.commit(batch)?;
        Ok(())
    }

    /// Submit a block for consideration (spec.md §4.7's seven-step
    /// algorithm).
    pub fn submit_block(&self, block: Block, now: u64) -> Result<SubmitOutcome, NodeError> {
        let _guard = self.tip_lock.lock().expect("tip lock poisoned");
        self.submit_locked(block, now)
    }

    fn submit_locked(&self, block: Block, now: u64) -> Result<SubmitOutcome, NodeError> {
        let hash = block.hash();
        if self.store.has_block(&hash)? {
            return Ok(SubmitOutcome::Duplicate);
        }

        self.stateless_checks(&block, now)?;

        let Some(parent) = self.store.get_index(&block.header.prev_block)? else {
            self.orphans
                .lock()
                .expect("orphan lock poisoned")
                .entry(block.header.prev_block)
                .or_default()
                .push(block);
            return Ok(SubmitOutcome::Orphan);
        };

        let outcome = self.connect_or_park(block, &parent)?;

        // Re-process any orphans waiting on whatever just got accepted.
        self.drain_orphans(&hash, now)?;

        Ok(outcome)
    }

    /// Feed any orphans whose missing parent just arrived back through
    /// acceptance, recursively draining further orphans those unblock.
    fn drain_orphans(&self, just_accepted: &Hash256, now: u64) -> Result<(), NodeError> {
        let waiting = self.orphans.lock().expect("orphan lock poisoned").remove(just_accepted);
        let Some(waiting) = waiting else { return Ok(()) };
        for orphan in waiting {
            let orphan_hash = orphan.hash();
            if self.stateless_checks(&orphan, now).is_err() {
                continue;
            }
            let Some(parent) = self.store.get_index(&orphan.header.prev_block)? else {
                continue;
            };
            if self.connect_or_park(orphan, &parent).is_ok() {
                self.drain_orphans(&orphan_hash, now)?;
            }
        }
        Ok(())
    }

    fn stateless_checks(&self, block: &Block, now: u64) -> Result<(), NodeError> {
        block_check::coinbase_is_first(block)?;
        let hashes: Vec<Hash256> = block.transactions.iter().map(|tx| tx.hash()).collect();
        block_check::no_duplicate_transactions(block, &hashes)?;
        block_check::merkle_root_validity(block, &hashes)?;
        block_check::difficulty_is_valid(block)?;
        block_check::time_is_valid_at(block, now, MAX_TIMESTAMP_DRIFT)?;
        block_check::outputs_within_max_money(block)?;
        for tx in &block.transactions {
            transaction_check::has_inputs_and_outputs(tx)?;
            transaction_check::no_duplicate_inputs(tx)?;
        }
        Ok(())
    }

    /// Given a block whose parent is known, decide extend/reorg/side-chain
    /// and act on it.
    fn connect_or_park(&self, block: Block, parent: &BlockIndex) -> Result<SubmitOutcome, NodeError> {
        let height = parent.height + 1;
        let new_work = parent.chain_work + block.header.bits.to_work();

        block_check::checkpoint_is_valid(height, block.hash(), checkpoints::checkpoint_at(self.network, height))
            .map_err(|_| NodeError::CheckpointViolation { height })?;

        let tip = self
            .store
            .get_tip()?
            .expect("ensure_genesis must run before any block is submitted");

        if block.header.prev_block == tip.best_hash {
            let connected_block = self.extend(block, parent, height)?;
            return Ok(SubmitOutcome::Extended {
                block: connected_block,
                height,
            });
        }

        if new_work <= tip.chain_work {
            // Less work than the current tip: store for later, don't connect.
            self.store_side_chain(&block, parent, height)?;
            return Ok(SubmitOutcome::SideChain { height });
        }

        let (disconnected, connected) = self.reorg_to(block, &tip)?;
        Ok(SubmitOutcome::Reorged {
            height,
            disconnected,
            connected,
        })
    }

    fn store_side_chain(&self, block: &Block, parent: &BlockIndex, height: u32) -> Result<(), NodeError> {
        let mut batch = self.store.begin_batch();
        batch.put_block(block);
        batch.put_index(&BlockIndex {
            hash: block.hash(),
            prev_hash: block.header.prev_block,
            height,
            timestamp: block.header.timestamp,
            bits: block.header.bits,
            tx_count: block.transactions.len() as u32,
            chain_work: parent.chain_work + block.header.bits.to_work(),
            file_pos: 0,
        });
        self.store.commit(batch)?;
        Ok(())
    }

    /// Extend the tip by one block: full contextual validation, then apply
    /// to the UTXO set and advance `ChainState` in one batch.
    fn extend(&self, block: Block, parent: &BlockIndex, height: u32) -> Result<Block, NodeError> {
        let mut batch = self.store.begin_batch();
        self.validate_contextual(&block, parent, height, &mut batch)?;
        let diff = self.apply_connect(&block, height, &mut batch)?;

        let tip = self.store.get_tip()?.expect("checked above");
        batch.put_block(&block);
        batch.put_index(&BlockIndex {
            hash: block.hash(),
            prev_hash: block.header.prev_block,
            height,
            timestamp: block.header.timestamp,
            bits: block.header.bits,
            tx_count: block.transactions.len() as u32,
            chain_work: parent.chain_work + block.header.bits.to_work(),
            file_pos: 0,
        });
        batch.put_height(height, block.hash());
        batch.put_undo(&block.hash(), &UndoData::from(&diff));
        batch.put_tip(&ChainState {
            best_hash: block.hash(),
            best_height: height,
            chain_work: parent.chain_work + block.header.bits.to_work(),
            total_transactions: tip.total_transactions + block.transactions.len() as u64,
            utxo_count: tip.utxo_count + diff.created.len() as u64 - diff.spent.len() as u64,
            total_supply: tip.total_supply + subsidy::subsidy(height),
        });
        self.store.commit(batch)?;
        info!(height, hash = ?block.hash(), "extended chain tip");
        Ok(block)
    }

    /// Full contextual validation for a candidate block about to be
    /// connected at `height` on top of `parent` (spec.md §4.5's contextual
    /// checks plus §4.4's UTXO apply, run together so both read the same
    /// view).
    fn validate_contextual(
        &self,
        block: &Block,
        parent: &BlockIndex,
        height: u32,
        _batch: &mut Batch,
    ) -> Result<(), NodeError> {
        let (first_ts, last_ts) = self.retarget_window(height, parent)?;
        block_check::retarget_is_valid(height, block.header.bits, parent.bits, first_ts, last_ts)?;

        let preceding = self.preceding_timestamps(&parent.hash)?;
        block_check::timestamp_after_median(block.header.timestamp, &preceding)?;
        Ok(())
    }

    /// Apply `block`'s transactions to the UTXO set within `batch`,
    /// running every per-transaction contextual check (coinbase maturity,
    /// signatures, coinbase reward) against the same resolved inputs
    /// `apply` already staged, instead of re-resolving inputs separately.
    fn apply_connect(&self, block: &Block, height: u32, batch: &mut Batch) -> Result<Diff, NodeError> {
        let diff = utxo::apply(block, height, &self.store, batch)?;

        let mut spent_per_tx: Vec<Vec<ember_state::types::UtxoEntry>> = Vec::with_capacity(block.transactions.len());
        let mut cursor = 0usize;
        for tx in &block.transactions {
            if tx.is_coinbase() {
                spent_per_tx.push(Vec::new());
                continue;
            }
            let count = tx.inputs.len();
            let entries: Vec<_> = diff.spent[cursor..cursor + count].iter().map(|(_, e)| e.clone()).collect();
            cursor += count;
            transaction_check::coinbase_maturity_is_valid(&entries, height, COINBASE_MATURITY, tx)?;
            spent_per_tx.push(entries);
        }

        signatures::verify_block::<ember_chain::crypto::DilithiumAdapter>(&block.transactions, &spent_per_tx)?;
        block_check::coinbase_reward_is_valid(block, subsidy::subsidy(height), diff.total_fees)?;

        Ok(diff)
    }

    /// Disconnect from the current tip down to the common ancestor with
    /// `block`'s branch, then connect that branch up through `block`,
    /// atomically.
    fn reorg_to(&self, block: Block, tip: &ChainState) -> Result<(Vec<Block>, Vec<Block>), NodeError> {
        // Walk back from the current tip and from the new block's parent
        // until the two walks meet, collecting each branch's hashes.
        let mut disconnect_hashes = Vec::new();
        let mut tip_cursor = self
            .store
            .get_index(&tip.best_hash)?
            .ok_or(ember_state::StoreError::MissingUtxo(ember_chain::transparent::OutPoint {
                tx_hash: tip.best_hash,
                index: 0,
            }))?;

        let mut connect_hashes = Vec::new();
        let mut new_cursor = self.store.get_index(&block.header.prev_block)?.expect("parent was just looked up");

        while tip_cursor.hash != new_cursor.hash {
            if tip_cursor.height >= new_cursor.height {
                disconnect_hashes.push(tip_cursor.hash);
                tip_cursor = self.store.get_index(&tip_cursor.prev_hash)?.expect("chain walks to genesis");
            } else {
                connect_hashes.push(new_cursor.hash);
                new_cursor = self
                    .store
                    .get_index(&new_cursor.prev_hash)?
                    .expect("side chain walks to a known ancestor");
            }
        }
        let ancestor = tip_cursor;
        // `connect_hashes` was collected walking from the new block's parent
        // back to `ancestor` (exclusive), so it is newest-first; reverse to
        // oldest-first, then append the new block itself, the newest.
        connect_hashes.reverse();
        connect_hashes.push(block.hash());

        if disconnect_hashes.len() as u32 > MAX_REORG_DEPTH {
            return Err(NodeError::ReorgTooDeep {
                depth: disconnect_hashes.len() as u32,
                max: MAX_REORG_DEPTH,
            });
        }

        let mut batch = self.store.begin_batch();

        let mut disconnected_blocks = Vec::with_capacity(disconnect_hashes.len());
        let mut total_tx = tip.total_transactions;
        let mut total_supply = tip.total_supply;
        let mut utxo_count = tip.utxo_count;
        for hash in &disconnect_hashes {
            let stored_index = self.store.get_index(hash)?.expect("disconnect block must be indexed");
            let stored_block = self.store.get_block(hash)?.expect("disconnect block must be stored");
            let undo_data = self
                .store
                .get_undo(hash)?
                .expect("every connected block has a persisted undo record");
            let diff: Diff = undo_data.into();
            utxo_count = utxo_count + diff.spent.len() as u64 - diff.created.len() as u64;
            utxo::undo(&diff, &self.store, &mut batch)?;
            total_tx -= stored_block.transactions.len() as u64;
            total_supply -= subsidy::subsidy(stored_index.height);
            disconnected_blocks.push(stored_block);
        }

        let mut running_work = ancestor.chain_work;
        let mut running_height = ancestor.height;
        let mut running_bits = ancestor.bits;
        let mut connected_blocks = Vec::with_capacity(connect_hashes.len());

        for (index, hash) in connect_hashes.iter().enumerate() {
            let candidate = if *hash == block.hash() {
                block.clone()
            } else {
                self.store.get_block(hash)?.expect("connect block must already be stored as a side chain block")
            };
            let height = running_height + 1;
            let parent_index = BlockIndex {
                hash: if index == 0 { ancestor.hash } else { connect_hashes[index - 1] },
                prev_hash: Hash256::zero(),
                height: running_height,
                timestamp: 0,
                bits: running_bits,
                tx_count: 0,
                chain_work: running_work,
                file_pos: 0,
            };
            // retarget/median-time context must come from the branch being
            // connected, not the discarded one, so look up timestamps via
            // the candidate's own prev_hash chain (already persisted).
            let (first_ts, last_ts) = self.retarget_window(height, &parent_index)?;
            block_check::retarget_is_valid(height, candidate.header.bits, running_bits, first_ts, last_ts)?;
            let preceding = self.preceding_timestamps(&parent_index.hash)?;
            block_check::timestamp_after_median(candidate.header.timestamp, &preceding)?;

            let diff = self.apply_connect(&candidate, height, &mut batch)?;
            batch.put_undo(&candidate.hash(), &UndoData::from(&diff));
            batch.put_height(height, candidate.hash());
            if *hash == block.hash() {
                batch.put_block(&candidate);
                batch.put_index(&BlockIndex {
                    hash: candidate.hash(),
                    prev_hash: candidate.header.prev_block,
                    height,
                    timestamp: candidate.header.timestamp,
                    bits: candidate.header.bits,
                    tx_count: candidate.transactions.len() as u32,
                    chain_work: running_work + candidate.header.bits.to_work(),
                    file_pos: 0,
                });
            }

            running_work += candidate.header.bits.to_work();
            running_bits = candidate.header.bits;
            running_height = height;
            total_tx += candidate.transactions.len() as u64;
            total_supply += subsidy::subsidy(height);
            utxo_count = utxo_count + diff.created.len() as u64 - diff.spent.len() as u64;
            connected_blocks.push(candidate);
        }

        batch.put_tip(&ChainState {
            best_hash: connected_blocks.last().expect("at least the new block connects").hash(),
            best_height: running_height,
            chain_work: running_work,
            total_transactions: total_tx,
            utxo_count,
            total_supply,
        });

        self.store.commit(batch)?;
        warn!(
            disconnected = disconnected_blocks.len(),
            connected = connected_blocks.len(),
            new_height = running_height,
            "reorganized chain"
        );
        // Undo runs newest-first (LIFO, matching how `disconnect_hashes` was
        // walked); the returned order is chain order, oldest first.
        disconnected_blocks.reverse();
        Ok((disconnected_blocks, connected_blocks))
    }

    /// Timestamps of up to `MEDIAN_TIME_WINDOW` blocks immediately
    /// preceding (and including) `from`, walked backward via `prev_hash`.
    fn preceding_timestamps(&self, from: &Hash256) -> Result<Vec<u64>, NodeError> {
        let mut out = Vec::with_capacity(MEDIAN_TIME_WINDOW);
        let mut cursor = *from;
        loop {
            let Some(index) = self.store.get_index(&cursor)? else { break };
            out.push(index.timestamp);
            if out.len() >= MEDIAN_TIME_WINDOW || index.height == 0 {
                break;
            }
            cursor = index.prev_hash;
        }
        Ok(out)
    }

    /// The retarget window's boundary timestamps for a block at `height`
    /// whose parent is `parent` (spec.md §4.8): `None`/`None` off a retarget
    /// boundary.
    fn retarget_window(&self, height: u32, parent: &BlockIndex) -> Result<(Option<u64>, Option<u64>), NodeError> {
        if height % parameters::RETARGET_INTERVAL != 0 {
            return Ok((None, None));
        }
        let first_height = height.saturating_sub(parameters::RETARGET_INTERVAL);
        let first = self
            .store
            .get_hash_at(first_height)?
            .and_then(|hash| self.store.get_index(&hash).ok().flatten())
            .map(|index| index.timestamp);
        Ok((first, Some(parent.timestamp)))
    }
}

#[cfg(test)]
mod tests {
    use ember_chain::block::{merkle, Header};
    use ember_chain::transaction::Transaction;
    use ember_chain::transparent::{OutPoint, TxInput, TxOutput};
    use ember_chain::work::difficulty::MAX_POW_TARGET;
    use tempfile::tempdir;

    use super::*;

    fn open_manager() -> (ChainManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = ember_state::Config {
            cache_dir: dir.path().to_path_buf(),
        };
        let store = Store::open(&config, Network::Testnet).unwrap();
        let manager = ChainManager::new(store, Network::Testnet);
        manager.ensure_genesis().unwrap();
        (manager, dir)
    }

    /// Mine a block containing only a coinbase paying `subsidy(height)`,
    /// extending `parent` (stable for quick single-branch test chains since
    /// `MAX_POW_TARGET` accepts nonce 0 for nearly any header).
    fn mine_block(parent: &BlockIndex, height: u32, timestamp: u64) -> Block {
        let coinbase = Transaction::new(
            1,
            vec![TxInput {
                prev: OutPoint::coinbase_sentinel(),
                witness: vec![height as u8],
                signature: vec![],
                sequence: 0xFFFF_FFFF,
            }],
            vec![TxOutput {
                value: subsidy::subsidy(height),
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            }],
            0,
            timestamp,
        );
        let root = merkle::root(&[coinbase.hash()]);
        let header = mine_header(1, parent.hash, root, timestamp, parent.bits);
        Block {
            header,
            transactions: vec![coinbase],
        }
    }

    /// Ground a header's nonce against its target, the same best-effort
    /// search `genesis_block` uses rather than assuming nonce 0 always
    /// satisfies the target.
    fn mine_header(
        version: u32,
        prev_block: ember_chain::hash::Hash256,
        merkle_root: ember_chain::hash::Hash256,
        timestamp: u64,
        bits: ember_chain::work::difficulty::CompactDifficulty,
    ) -> Header {
        let mut nonce = 0u64;
        let mut header = Header::new(version, prev_block, merkle_root, timestamp, bits, nonce);
        while !header.pow_is_valid() {
            nonce += 1;
            assert!(nonce < 1_000, "target is no longer easy enough for a nonce search");
            header = Header::new(version, prev_block, merkle_root, timestamp, bits, nonce);
        }
        header
    }

    fn tip_index(manager: &ChainManager) -> BlockIndex {
        let tip = manager.store().get_tip().unwrap().unwrap();
        manager.store().get_index(&tip.best_hash).unwrap().unwrap()
    }

    #[test]
    fn genesis_bootstraps_a_tip() {
        let (manager, _dir) = open_manager();
        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 0);
        assert_eq!(tip.best_hash, Network::Testnet.genesis_hash());
    }

    #[test]
    fn ensure_genesis_is_idempotent() {
        let (manager, _dir) = open_manager();
        manager.ensure_genesis().unwrap();
        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 0);
    }

    #[test]
    fn extends_the_tip_one_block_at_a_time() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let block = mine_block(&genesis, 1, genesis.timestamp + 120);

        let outcome = manager.submit_block(block.clone(), u64::MAX).unwrap();
        match outcome {
            SubmitOutcome::Extended { height, .. } => assert_eq!(height, 1),
            other => panic!("expected Extended, got {other:?}"),
        }
        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 1);
        assert_eq!(tip.best_hash, block.hash());
    }

    #[test]
    fn resubmitting_a_known_block_is_a_duplicate() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let block = mine_block(&genesis, 1, genesis.timestamp + 120);
        manager.submit_block(block.clone(), u64::MAX).unwrap();
        let outcome = manager.submit_block(block, u64::MAX).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Duplicate));
    }

    #[test]
    fn a_block_with_an_unknown_parent_is_parked_as_an_orphan() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let block_one = mine_block(&genesis, 1, genesis.timestamp + 120);
        let fake_parent = BlockIndex {
            hash: block_one.hash(),
            prev_hash: genesis.hash,
            height: 1,
            timestamp: block_one.header.timestamp,
            bits: block_one.header.bits,
            tx_count: 1,
            chain_work: genesis.chain_work + block_one.header.bits.to_work(),
            file_pos: 0,
        };
        let orphan = mine_block(&fake_parent, 2, fake_parent.timestamp + 120);

        let outcome = manager.submit_block(orphan, u64::MAX).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Orphan));
        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 0, "orphan must not advance the tip");
    }

    #[test]
    fn submitting_the_missing_parent_drains_the_waiting_orphan() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let block_one = mine_block(&genesis, 1, genesis.timestamp + 120);
        let index_one = BlockIndex {
            hash: block_one.hash(),
            prev_hash: genesis.hash,
            height: 1,
            timestamp: block_one.header.timestamp,
            bits: block_one.header.bits,
            tx_count: 1,
            chain_work: genesis.chain_work + block_one.header.bits.to_work(),
            file_pos: 0,
        };
        let block_two = mine_block(&index_one, 2, index_one.timestamp + 120);

        let outcome = manager.submit_block(block_two.clone(), u64::MAX).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Orphan));

        let outcome = manager.submit_block(block_one, u64::MAX).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Extended { height: 1, .. }));

        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 2, "draining the orphan should connect it too");
        assert_eq!(tip.best_hash, block_two.hash());
    }

    #[test]
    fn a_lower_work_branch_is_stored_without_moving_the_tip() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let main = mine_block(&genesis, 1, genesis.timestamp + 120);
        manager.submit_block(main.clone(), u64::MAX).unwrap();

        // A second block directly on genesis has the same work as `main`
        // (equal bits), so `new_work <= tip.chain_work` holds and it is
        // filed as a side chain rather than displacing the tip.
        let side = mine_block(&genesis, 1, genesis.timestamp + 60);
        let outcome = manager.submit_block(side.clone(), u64::MAX).unwrap();
        assert!(matches!(outcome, SubmitOutcome::SideChain { height: 1 }));

        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_hash, main.hash());
        assert!(manager.store().get_utxo(&OutPoint { tx_hash: side.transactions[0].hash(), index: 0 }).unwrap().is_none());
    }

    #[test]
    fn a_heavier_side_branch_triggers_a_reorg() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);

        let main_one = mine_block(&genesis, 1, genesis.timestamp + 120);
        manager.submit_block(main_one.clone(), u64::MAX).unwrap();
        let main_one_index = manager.store().get_index(&main_one.hash()).unwrap().unwrap();
        let main_two = mine_block(&main_one_index, 2, main_one_index.timestamp + 120);
        manager.submit_block(main_two.clone(), u64::MAX).unwrap();

        // Build a two-block side branch off genesis; submitted in order it
        // overtakes the two-block main branch only once the second side
        // block lands (equal per-block work, so it needs one more block).
        let side_one = mine_block(&genesis, 1, genesis.timestamp + 30);
        let side_outcome = manager.submit_block(side_one.clone(), u64::MAX).unwrap();
        assert!(matches!(side_outcome, SubmitOutcome::SideChain { height: 1 }));
        let side_one_index = manager.store().get_index(&side_one.hash()).unwrap().unwrap();
        let side_two = mine_block(&side_one_index, 2, side_one_index.timestamp + 30);
        let side_two_outcome = manager.submit_block(side_two.clone(), u64::MAX).unwrap();
        assert!(matches!(side_two_outcome, SubmitOutcome::SideChain { height: 2 }));

        let side_three = mine_block(&manager.store().get_index(&side_two.hash()).unwrap().unwrap(), 3, side_two.header.timestamp + 30);
        let outcome = manager.submit_block(side_three.clone(), u64::MAX).unwrap();
        match outcome {
            SubmitOutcome::Reorged { height, disconnected, connected } => {
                assert_eq!(height, 3);
                assert_eq!(disconnected.len(), 2);
                assert_eq!(connected.len(), 3);
            }
            other => panic!("expected Reorged, got {other:?}"),
        }

        let tip = manager.store().get_tip().unwrap().unwrap();
        assert_eq!(tip.best_height, 3);
        assert_eq!(tip.best_hash, side_three.hash());
        assert!(manager.store().get_utxo(&OutPoint { tx_hash: main_one.transactions[0].hash(), index: 0 }).unwrap().is_none());
        assert!(manager.store().get_utxo(&OutPoint { tx_hash: main_two.transactions[0].hash(), index: 0 }).unwrap().is_none());
    }

    #[test]
    fn expected_bits_matches_parent_bits_off_a_retarget_boundary() {
        let (manager, _dir) = open_manager();
        let genesis = tip_index(&manager);
        let bits = manager.expected_bits(1, &genesis).unwrap();
        assert_eq!(bits, MAX_POW_TARGET);
    }

    /// Spec scenario 6 (difficulty retarget) at this crate's real
    /// `RETARGET_INTERVAL`/`TARGET_SPACING`: rather than mining 2016 real
    /// blocks, plant the two boundary index entries `retarget_window`
    /// reads directly and confirm `expected_bits` reproduces the exact
    /// `next_work_required` computation, clamped the same way.
    #[test]
    fn expected_bits_applies_the_retarget_formula_at_a_boundary() {
        let (manager, _dir) = open_manager();
        let store = manager.store();

        let first_hash = Hash256::of(b"interval start");
        let first_timestamp = 1_700_000_000u64;
        let mut batch = store.begin_batch();
        batch.put_index(&BlockIndex {
            hash: first_hash,
            prev_hash: Hash256::zero(),
            height: 0,
            timestamp: first_timestamp,
            bits: MAX_POW_TARGET,
            tx_count: 0,
            chain_work: MAX_POW_TARGET.to_work(),
            file_pos: 0,
        });
        batch.put_height(0, first_hash);
        store.commit(batch).unwrap();

        // The interval closed in a quarter of its target time: blocks
        // every 30s instead of every TARGET_SPACING=120s.
        let fast_timespan = (parameters::RETARGET_INTERVAL as u64) * 30;
        let parent = BlockIndex {
            hash: Hash256::of(b"interval end"),
            prev_hash: first_hash,
            height: parameters::RETARGET_INTERVAL - 1,
            timestamp: first_timestamp + fast_timespan,
            bits: MAX_POW_TARGET,
            tx_count: 0,
            chain_work: MAX_POW_TARGET.to_work(),
            file_pos: 0,
        };

        let bits = manager.expected_bits(parameters::RETARGET_INTERVAL, &parent).unwrap();
        let expected = retarget::next_work_required(
            parameters::RETARGET_INTERVAL,
            parent.bits,
            Some(first_timestamp),
            Some(parent.timestamp),
        );
        assert_eq!(bits, expected);
        assert!(
            bits.to_expanded().unwrap().0 < MAX_POW_TARGET.to_expanded().unwrap().0,
            "faster-than-target blocks must tighten the target"
        );
    }
}
