use std::sync::Mutex;

use ember_chain::block::Block;
use ember_chain::codec::{decode_persisted, Decode};
use ember_chain::hash::Hash256;
use ember_chain::parameters::Network;
use ember_chain::transparent::OutPoint;
use tracing::error;

use crate::batch::{Batch, BLOCK_HEADER, INDEX_HEADER, STATE_HEADER, UNDO_HEADER, UTXO_HEADER};
use crate::config::Config;
use crate::error::StoreError;
use crate::keys;
use crate::types::{BlockIndex, ChainState, TxLocation, UndoData, UtxoEntry};

/// The embedded store: one `sled::Tree` holding every namespace, a write
/// lock serializing `commit`, and an in-memory mirror of the tip so reads
/// of the hot path don't all round-trip through sled (spec.md §4.3, §5).
pub struct Store {
    db: sled::Db,
    tree: sled::Tree,
    // Guards the only writer path; readers proceed against sled's own
    // snapshot isolation without taking this lock (spec.md §5).
    write_lock: Mutex<()>,
}

impl Store {
    pub fn open(config: &Config, network: Network) -> Result<Self, StoreError> {
        let db = config.sled_config(network).open()?;
        let tree = db.open_tree(b"ember")?;
        Ok(Store {
            db,
            tree,
            write_lock: Mutex::new(()),
        })
    }

    pub fn begin_batch(&self) -> Batch {
        Batch::new()
    }

    /// Apply a batch atomically. On success every write in the batch is
    /// durable; on a crash before this returns, the store is left exactly
    /// at the prior tip (spec.md §4.3).
    pub fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().expect("write lock poisoned");
        self.tree.apply_batch(batch.sled_batch)?;
        self.tree.flush()?;
        Ok(())
    }

    pub fn has_block(&self, hash: &Hash256) -> Result<bool, StoreError> {
        Ok(self.tree.contains_key(keys::block(hash))?)
    }

    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>, StoreError> {
        match self.tree.get(keys::block(hash))? {
            Some(bytes) => Ok(Some(self.decode_or_corrupt(&keys::block(hash), &bytes, BLOCK_HEADER)?)),
            None => Ok(None),
        }
    }

    pub fn get_index(&self, hash: &Hash256) -> Result<Option<BlockIndex>, StoreError> {
        match self.tree.get(keys::index(hash))? {
            Some(bytes) => Ok(Some(self.decode_or_corrupt(&keys::index(hash), &bytes, INDEX_HEADER)?)),
            None => Ok(None),
        }
    }

    pub fn get_hash_at(&self, height: u32) -> Result<Option<Hash256>, StoreError> {
        match self.tree.get(keys::height(height))? {
            Some(bytes) => {
                let mut array = [0u8; 32];
                array.copy_from_slice(&bytes);
                Ok(Some(Hash256::from_bytes(array)))
            }
            None => Ok(None),
        }
    }

    pub fn get_tx_location(&self, txid: &Hash256) -> Result<Option<TxLocation>, StoreError> {
        match self.tree.get(keys::tx(txid))? {
            Some(bytes) => Ok(Some(Decode::decode(&mut std::io::Cursor::new(bytes.as_ref())).map_err(
                |source| StoreError::Corruption {
                    key: format!("{txid}"),
                    source,
                },
            )?)),
            None => Ok(None),
        }
    }

    pub fn get_utxo(&self, outpoint: &OutPoint) -> Result<Option<UtxoEntry>, StoreError> {
        match self.tree.get(keys::utxo(outpoint))? {
            Some(bytes) => Ok(Some(self.decode_or_corrupt(&keys::utxo(outpoint), &bytes, UTXO_HEADER)?)),
            None => Ok(None),
        }
    }

    pub fn get_undo(&self, block_hash: &Hash256) -> Result<Option<UndoData>, StoreError> {
        match self.tree.get(keys::undo(block_hash))? {
            Some(bytes) => Ok(Some(self.decode_or_corrupt(&keys::undo(block_hash), &bytes, UNDO_HEADER)?)),
            None => Ok(None),
        }
    }

    pub fn get_tip(&self) -> Result<Option<ChainState>, StoreError> {
        match self.tree.get(keys::STATE_TIP)? {
            Some(bytes) => Ok(Some(self.decode_or_corrupt(keys::STATE_TIP, &bytes, STATE_HEADER)?)),
            None => Ok(None),
        }
    }

    /// Addresses' reverse-index lookup: every live outpoint paying `address`.
    pub fn utxos_for_address(&self, address: &str) -> Result<Vec<OutPoint>, StoreError> {
        let prefix = keys::addr_prefix(address);
        let mut out = Vec::new();
        for item in self.tree.scan_prefix(&prefix) {
            let (key, _) = item?;
            let tail = &key[prefix.len()..];
            if tail.len() != 36 {
                continue;
            }
            let mut tx_hash = [0u8; 32];
            tx_hash.copy_from_slice(&tail[..32]);
            let mut index_bytes = [0u8; 4];
            index_bytes.copy_from_slice(&tail[32..]);
            out.push(OutPoint {
                tx_hash: Hash256::from_bytes(tx_hash),
                index: u32::from_be_bytes(index_bytes),
            });
        }
        Ok(out)
    }

    /// Decode a persisted value. A magic/version mismatch is an ordinary,
    /// catchable `StoreError::VersionMismatch` (spec.md §4.1, §6, §7) — it
    /// means this build is older or newer than whatever wrote the entry,
    /// not that the entry is damaged. Every other decode failure is
    /// genuine corruption and is fatal: log and exit after flushing,
    /// rather than returning a typed error the caller might paper over
    /// (spec.md §7: corruption is the *only* error that terminates the
    /// process).
    fn decode_or_corrupt<T: Decode>(
        &self,
        key: &[u8],
        bytes: &[u8],
        header: ember_chain::codec::PersistedHeader,
    ) -> Result<T, StoreError> {
        match decode_persisted(header, bytes) {
            Ok(value) => Ok(value),
            Err(ember_chain::codec::CodecError::VersionMismatch) => {
                let key = String::from_utf8_lossy(key).into_owned();
                Err(StoreError::VersionMismatch { key })
            }
            Err(source) => {
                let key = String::from_utf8_lossy(key).into_owned();
                error!(%key, %source, "fatal: store entry failed to decode, exiting");
                let _ = self.db.flush();
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ember_chain::parameters::genesis::genesis_block;

    use super::*;

    fn open_test_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            cache_dir: dir.path().to_path_buf(),
        };
        let store = Store::open(&config, Network::Testnet).unwrap();
        (store, dir)
    }

    #[test]
    fn a_version_mismatch_returns_an_error_instead_of_exiting() {
        use ember_chain::codec::{encode_persisted, PersistedHeader};

        let (store, _dir) = open_test_store();
        let block = genesis_block(Network::Testnet);
        let hash = block.hash();

        // Write the block under a header version this build doesn't
        // expect, simulating a database from different node software
        // rather than a corrupted entry.
        let future_header = PersistedHeader::new(*b"BLK", BLOCK_HEADER.version + 1);
        let bytes = encode_persisted(future_header, &block);
        store.tree.insert(keys::block(&hash), bytes).unwrap();

        match store.get_block(&hash) {
            Err(StoreError::VersionMismatch { .. }) => {}
            other => panic!("expected VersionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn put_and_get_block_roundtrips() {
        ember_test::init();
        let (store, _dir) = open_test_store();
        let block = genesis_block(Network::Testnet);
        let hash = block.hash();

        let mut batch = store.begin_batch();
        batch.put_block(&block);
        store.commit(batch).unwrap();

        assert!(store.has_block(&hash).unwrap());
        let fetched = store.get_block(&hash).unwrap().unwrap();
        assert_eq!(fetched.hash(), hash);
    }

    #[test]
    fn missing_block_returns_none() {
        let (store, _dir) = open_test_store();
        assert!(store.get_block(&Hash256::of(b"nope")).unwrap().is_none());
        assert!(!store.has_block(&Hash256::of(b"nope")).unwrap());
    }

    #[test]
    fn put_and_get_index_and_height() {
        let (store, _dir) = open_test_store();
        let index = BlockIndex {
            hash: Hash256::of(b"block"),
            prev_hash: Hash256::zero(),
            height: 5,
            timestamp: 1,
            bits: ember_chain::work::difficulty::CompactDifficulty(0x1d00_ffff),
            tx_count: 1,
            chain_work: primitive_types::U256::from(1u64),
            file_pos: 0,
        };

        let mut batch = store.begin_batch();
        batch.put_index(&index);
        batch.put_height(index.height, index.hash);
        store.commit(batch).unwrap();

        let fetched = store.get_index(&index.hash).unwrap().unwrap();
        assert_eq!(fetched, index);
        assert_eq!(store.get_hash_at(5).unwrap().unwrap(), index.hash);
    }

    #[test]
    fn utxo_insert_and_delete() {
        let (store, _dir) = open_test_store();
        let outpoint = OutPoint {
            tx_hash: Hash256::of(b"tx"),
            index: 0,
        };
        let entry = UtxoEntry {
            output: ember_chain::transparent::TxOutput {
                value: 5000,
                script_pubkey: vec![],
                recipient_pubkey: vec![0xAB; 32],
            },
            height: 1,
            is_coinbase: false,
        };

        let address = ember_chain::crypto::address(&entry.output.recipient_pubkey);
        let mut batch = store.begin_batch();
        batch.put_utxo(outpoint, entry.clone(), Some(&address));
        store.commit(batch).unwrap();

        assert_eq!(store.get_utxo(&outpoint).unwrap(), Some(entry));
        assert_eq!(store.utxos_for_address(&address).unwrap(), vec![outpoint]);

        let mut batch = store.begin_batch();
        batch.del_utxo(outpoint, Some(&address));
        store.commit(batch).unwrap();

        assert_eq!(store.get_utxo(&outpoint).unwrap(), None);
        assert!(store.utxos_for_address(&address).unwrap().is_empty());
    }

    #[test]
    fn tip_roundtrips() {
        let (store, _dir) = open_test_store();
        assert_eq!(store.get_tip().unwrap(), None);

        let state = ChainState::genesis(Hash256::of(b"genesis"), 50_0000_0000);
        let mut batch = store.begin_batch();
        batch.put_tip(&state);
        store.commit(batch).unwrap();

        assert_eq!(store.get_tip().unwrap(), Some(state));
    }

    #[test]
    fn batch_staged_utxo_visible_before_commit() {
        let (store, _dir) = open_test_store();
        let outpoint = OutPoint {
            tx_hash: Hash256::of(b"tx"),
            index: 0,
        };
        let entry = UtxoEntry {
            output: ember_chain::transparent::TxOutput {
                value: 1,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            },
            height: 0,
            is_coinbase: false,
        };

        let mut batch = store.begin_batch();
        assert!(batch.staged_utxo(&outpoint).is_none());
        batch.put_utxo(outpoint, entry.clone(), None);
        assert_eq!(batch.staged_utxo(&outpoint), Some(Some(&entry)));
        // The underlying store hasn't seen it yet.
        assert_eq!(store.get_utxo(&outpoint).unwrap(), None);
        store.commit(batch).unwrap();
        assert_eq!(store.get_utxo(&outpoint).unwrap(), Some(entry));
    }

    #[test]
    fn batch_staged_deletion_is_distinguishable_from_never_staged() {
        let (store, _dir) = open_test_store();
        let outpoint = OutPoint {
            tx_hash: Hash256::of(b"tx"),
            index: 0,
        };
        let entry = UtxoEntry {
            output: ember_chain::transparent::TxOutput {
                value: 1,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            },
            height: 0,
            is_coinbase: false,
        };
        let mut batch = store.begin_batch();
        batch.put_utxo(outpoint, entry, None);
        store.commit(batch).unwrap();

        let mut spend_batch = store.begin_batch();
        spend_batch.del_utxo(outpoint, None);
        // A deletion staged within this batch must read back as "staged,
        // gone" (`Some(None)`), not "never staged" (`None`) — the latter
        // would fall through to the pre-batch store and still see the
        // entry, letting a second spend of the same outpoint in the same
        // block succeed.
        assert_eq!(spend_batch.staged_utxo(&outpoint), Some(None));

        let never_staged = OutPoint {
            tx_hash: Hash256::of(b"other"),
            index: 0,
        };
        assert_eq!(spend_batch.staged_utxo(&never_staged), None);
    }
}
