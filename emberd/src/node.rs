//! `Node`: the top-level composition point (spec.md §9's "Global
//! singletons" design note — one value owning the store, chain manager, and
//! mempool, constructed once, instead of the teacher's process-wide
//! `abscissa_core` application singleton).

use std::sync::Mutex;

use ember_chain::block::Block;
use ember_chain::hash::Hash256;
use ember_chain::parameters::Network;
use ember_chain::transaction::Transaction;
use ember_chain::transparent::OutPoint;
use ember_consensus::parameters::subsidy;
use ember_consensus::transaction::check as transaction_check;
use ember_mempool::{Entry, Mempool};
use ember_state::types::{ChainState, TxLocation, UtxoEntry};
use tracing::info;

use crate::chain::{ChainManager, SubmitOutcome};
use crate::config::Config;
use crate::error::NodeError;

/// The full node: owns the store (through `ChainManager`) and the mempool,
/// and exposes the collaborator interface spec.md §6 names.
pub struct Node {
    chain: ChainManager,
    mempool: Mutex<Mempool>,
}

impl Node {
    pub fn open(config: &Config) -> color_eyre::Result<Node> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = ember_state::Store::open(&config.store_config(), config.network)?;
        let chain = ChainManager::new(store, config.network);
        chain.ensure_genesis()?;
        Ok(Node {
            chain,
            mempool: Mutex::new(Mempool::new(config.max_mempool_size)),
        })
    }

    pub fn network(&self) -> Network {
        self.chain.network()
    }

    /// Validate and admit a transaction to the mempool (spec.md §4.6).
    pub fn submit_transaction(&self, tx: Transaction, now: u64) -> Result<Hash256, NodeError> {
        transaction_check::has_inputs_and_outputs(&tx)?;
        transaction_check::no_duplicate_inputs(&tx)?;

        let tip = self
            .chain
            .store()
            .get_tip()?
            .ok_or_else(|| ember_state::StoreError::MissingUtxo(OutPoint {
                tx_hash: Hash256::zero(),
                index: 0,
            }))?;
        let spent = transaction_check::resolve_inputs(&tx, self.chain.store())?;
        transaction_check::coinbase_maturity_is_valid(
            &spent,
            tip.best_height,
            ember_chain::parameters::COINBASE_MATURITY,
            &tx,
        )?;
        transaction_check::signatures_are_valid::<ember_chain::crypto::DilithiumAdapter>(&tx, &spent)?;
        let fee = transaction_check::fee(&tx, &spent)?;

        let mut mempool = self.mempool.lock().expect("mempool lock poisoned");
        let txid = mempool.insert(tx, fee, now)?;
        info!(%txid, fee, "admitted transaction to mempool");
        Ok(txid)
    }

    /// Submit a block for acceptance (spec.md §4.7), reconciling the
    /// mempool against whatever just changed on the active chain.
    pub fn submit_block(&self, block: Block, now: u64) -> Result<SubmitOutcome, NodeError> {
        let outcome = self.chain.submit_block(block, now)?;
        self.reconcile_mempool(&outcome, now);
        Ok(outcome)
    }

    fn reconcile_mempool(&self, outcome: &SubmitOutcome, now: u64) {
        let mut mempool = self.mempool.lock().expect("mempool lock poisoned");
        match outcome {
            SubmitOutcome::Extended { block, .. } => mempool.remove_confirmed(block),
            SubmitOutcome::Reorged {
                disconnected,
                connected,
                ..
            } => {
                for block in connected {
                    mempool.remove_confirmed(block);
                }
                // Transactions unique to the disconnected branch return to
                // the mempool if they still have a valid UTXO view under
                // the new tip; anything now a double-spend is dropped
                // silently (spec.md §7's "transient conflicts... drop-silent").
                for block in disconnected {
                    for tx in &block.transactions {
                        if tx.is_coinbase() {
                            continue;
                        }
                        if let Ok(spent) = transaction_check::resolve_inputs(tx, self.chain.store()) {
                            if let Ok(fee) = transaction_check::fee(tx, &spent) {
                                let _ = mempool.insert(tx.clone(), fee, now);
                            }
                        }
                    }
                }
            }
            SubmitOutcome::Duplicate | SubmitOutcome::Orphan | SubmitOutcome::SideChain { .. } => {}
        }
    }

    pub fn get_tip(&self) -> Result<Option<ChainState>, NodeError> {
        Ok(self.chain.store().get_tip()?)
    }

    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>, NodeError> {
        Ok(self.chain.store().get_block(hash)?)
    }

    pub fn get_block_at(&self, height: u32) -> Result<Option<Block>, NodeError> {
        match self.chain.store().get_hash_at(height)? {
            Some(hash) => self.get_block(&hash),
            None => Ok(None),
        }
    }

    /// The transaction and the height of the block confirming it, if known.
    pub fn get_transaction(&self, txid: &Hash256) -> Result<Option<(Transaction, u32)>, NodeError> {
        let Some(TxLocation { block_hash, offset }) = self.chain.store().get_tx_location(txid)? else {
            return Ok(None);
        };
        let Some(block) = self.chain.store().get_block(&block_hash)? else {
            return Ok(None);
        };
        let Some(index) = self.chain.store().get_index(&block_hash)? else {
            return Ok(None);
        };
        Ok(block.transactions.get(offset as usize).cloned().map(|tx| (tx, index.height)))
    }

    pub fn get_utxo(&self, outpoint: &OutPoint) -> Result<Option<UtxoEntry>, NodeError> {
        Ok(self.chain.store().get_utxo(outpoint)?)
    }

    pub fn get_utxos_by_address(&self, address: &str) -> Result<Vec<OutPoint>, NodeError> {
        Ok(self.chain.store().utxos_for_address(address)?)
    }

    /// A snapshot of every mempool entry, highest fee rate first.
    pub fn get_mempool_snapshot(&self) -> Vec<Entry> {
        let mempool = self.mempool.lock().expect("mempool lock poisoned");
        mempool.get_for_block(usize::MAX, usize::MAX).into_iter().cloned().collect()
    }

    /// Assemble a block template: a coinbase paying `subsidy + fees` to
    /// `reward_pubkey`, followed by the mempool's best-fee-rate selection,
    /// targeting the current difficulty with the nonce left for the miner
    /// to solve (spec.md §6).
    pub fn build_block_template(&self, reward_pubkey: Vec<u8>) -> Result<Block, NodeError> {
        let tip = self
            .chain
            .store()
            .get_tip()?
            .ok_or_else(|| ember_state::StoreError::MissingUtxo(OutPoint {
                tx_hash: Hash256::zero(),
                index: 0,
            }))?;
        let parent = self
            .chain
            .store()
            .get_index(&tip.best_hash)?
            .expect("tip always has an index entry");
        let height = parent.height + 1;

        let mempool = self.mempool.lock().expect("mempool lock poisoned");
        let selected = mempool.get_for_block(usize::MAX, ember_chain::parameters::MAX_BLOCK_SIZE);
        let fees: u64 = selected.iter().map(|entry| entry.fee).sum();
        let transactions: Vec<Transaction> = selected.iter().map(|entry| entry.tx.clone()).collect();
        drop(mempool);

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is after the epoch")
            .as_secs();

        let coinbase = Transaction::new(
            1,
            vec![ember_chain::transparent::TxInput {
                prev: OutPoint::coinbase_sentinel(),
                witness: height.to_le_bytes().to_vec(),
                signature: vec![],
                sequence: 0xFFFF_FFFF,
            }],
            vec![ember_chain::transparent::TxOutput {
                value: subsidy::subsidy(height) + fees,
                script_pubkey: vec![],
                recipient_pubkey: reward_pubkey,
            }],
            0,
            now,
        );

        let mut all_transactions = vec![coinbase];
        all_transactions.extend(transactions);
        let hashes: Vec<Hash256> = all_transactions.iter().map(|tx| tx.hash()).collect();
        let merkle_root = ember_chain::block::merkle::root(&hashes);

        let bits = self.chain.expected_bits(height, &parent)?;

        Ok(Block {
            header: ember_chain::block::header::Header::new(1, tip.best_hash, merkle_root, now, bits, 0),
            transactions: all_transactions,
        })
    }
}
