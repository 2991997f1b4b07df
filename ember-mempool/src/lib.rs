//! The fee-prioritized pool of unconfirmed transactions (spec.md §4.6).

pub mod entry;
pub mod error;
mod mempool;

pub use entry::{Entry, FeeRateKey};
pub use error::MempoolError;
pub use mempool::{Mempool, MAX_AGE_SECS};

#[cfg(test)]
mod tests {
    use ember_chain::parameters::DUST_THRESHOLD;
    use ember_chain::transaction::Transaction;
    use ember_chain::transparent::{OutPoint, TxInput, TxOutput};

    use super::*;

    fn spending(seed: u8, index: u32, value: u64) -> Transaction {
        Transaction::new(
            1,
            vec![TxInput {
                prev: OutPoint {
                    tx_hash: ember_chain::hash::Hash256::of(&[seed]),
                    index,
                },
                witness: vec![],
                signature: vec![0xAB; 16],
                sequence: 0,
            }],
            vec![TxOutput {
                value,
                script_pubkey: vec![0x01],
                recipient_pubkey: vec![0xCD; 32],
            }],
            0,
            1_700_000_000,
        )
    }

    fn fee_for(tx: &Transaction, fee: u64) -> u64 {
        let _ = tx;
        fee
    }

    #[test]
    fn admits_and_finds_a_transaction() {
        ember_test::init();
        let mut pool = Mempool::default();
        let tx = spending(1, 0, DUST_THRESHOLD + 1000);
        let fee = fee_for(&tx, 10_000);
        let txid = pool.insert(tx, fee, 1_700_000_000).unwrap();
        assert!(pool.has(&txid));
        assert_eq!(pool.get(&txid).unwrap().fee, fee);
    }

    #[test]
    fn rejects_duplicate_admission() {
        let mut pool = Mempool::default();
        let tx = spending(1, 0, DUST_THRESHOLD + 1000);
        pool.insert(tx.clone(), 10_000, 0).unwrap();
        let err = pool.insert(tx, 10_000, 0).unwrap_err();
        assert!(matches!(err, MempoolError::AlreadyPresent(_)));
    }

    #[test]
    fn rejects_coinbase() {
        let mut pool = Mempool::default();
        let tx = Transaction::new(
            1,
            vec![TxInput {
                prev: OutPoint::coinbase_sentinel(),
                witness: vec![],
                signature: vec![],
                sequence: 0xFFFF_FFFF,
            }],
            vec![TxOutput {
                value: 50_0000_0000,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            }],
            0,
            0,
        );
        let err = pool.insert(tx, 0, 0).unwrap_err();
        assert!(matches!(err, MempoolError::Coinbase));
    }

    #[test]
    fn rejects_dust_output() {
        let mut pool = Mempool::default();
        let tx = spending(1, 0, DUST_THRESHOLD - 1);
        let err = pool.insert(tx, 10_000, 0).unwrap_err();
        assert!(matches!(err, MempoolError::DustOutput));
    }

    #[test]
    fn rejects_conflicting_spend() {
        let mut pool = Mempool::default();
        let tx1 = spending(1, 0, DUST_THRESHOLD + 1000);
        let mut tx2 = spending(1, 0, DUST_THRESHOLD + 2000);
        tx2.lock_time = 1; // differ from tx1 so hashes differ
        pool.insert(tx1, 10_000, 0).unwrap();
        let err = pool.insert(tx2, 10_000, 0).unwrap_err();
        assert!(matches!(err, MempoolError::Conflict(_, _)));
    }

    #[test]
    fn fee_eviction_prefers_higher_fee_rate() {
        // Mempool capped to hold roughly two of these transactions.
        let tx_low = spending(1, 0, DUST_THRESHOLD + 1000);
        let size = tx_low.len();
        let mut pool = Mempool::new(size * 2);

        let low_id = pool.insert(tx_low, 1 * size as u64, 0).unwrap();
        let mid_id = pool
            .insert(spending(2, 0, DUST_THRESHOLD + 1000), 5 * size as u64, 1)
            .unwrap();
        assert!(pool.has(&low_id));
        assert!(pool.has(&mid_id));

        // A higher-fee-rate tx should evict the lowest-fee-rate entry.
        let high_id = pool
            .insert(spending(3, 0, DUST_THRESHOLD + 1000), 10 * size as u64, 2)
            .unwrap();
        assert!(!pool.has(&low_id));
        assert!(pool.has(&mid_id));
        assert!(pool.has(&high_id));
    }

    #[test]
    fn full_pool_rejects_lower_fee_rate_admission() {
        let tx_a = spending(1, 0, DUST_THRESHOLD + 1000);
        let size = tx_a.len();
        let mut pool = Mempool::new(size);
        pool.insert(tx_a, 10 * size as u64, 0).unwrap();

        let tx_b = spending(2, 0, DUST_THRESHOLD + 1000);
        let err = pool.insert(tx_b, 1 * size as u64, 1).unwrap_err();
        assert!(matches!(err, MempoolError::Full));
    }

    #[test]
    fn remove_confirmed_clears_block_transactions() {
        use ember_chain::block::header::Header;
        use ember_chain::block::Block;
        use ember_chain::work::difficulty::CompactDifficulty;

        let tx = spending(1, 0, DUST_THRESHOLD + 1000);
        let txid = tx.hash();
        let mut pool = Mempool::default();
        pool.insert(tx.clone(), 10_000, 0).unwrap();

        let block = Block {
            header: Header::new(
                1,
                ember_chain::hash::Hash256::zero(),
                ember_chain::hash::Hash256::zero(),
                0,
                CompactDifficulty(0x1d00_ffff),
                0,
            ),
            transactions: vec![tx],
        };
        pool.remove_confirmed(&block);
        assert!(!pool.has(&txid));
    }

    #[test]
    fn expire_drops_stale_entries() {
        let mut pool = Mempool::default();
        let tx = spending(1, 0, DUST_THRESHOLD + 1000);
        let txid = pool.insert(tx, 10_000, 1_000).unwrap();

        let expired = pool.expire(1_000 + MAX_AGE_SECS + 1);
        assert_eq!(expired, vec![txid]);
        assert!(pool.is_empty());
    }

    #[test]
    fn get_for_block_orders_by_fee_rate_descending() {
        let mut pool = Mempool::default();
        let tx_low = spending(1, 0, DUST_THRESHOLD + 1000);
        let size = tx_low.len();
        let low_id = pool.insert(tx_low, 1 * size as u64, 0).unwrap();
        let high_id = pool
            .insert(spending(2, 0, DUST_THRESHOLD + 1000), 10 * size as u64, 1)
            .unwrap();

        let template = pool.get_for_block(10, size * 10);
        assert_eq!(template[0].txid, high_id);
        assert_eq!(template[1].txid, low_id);
    }

    #[test]
    fn dependencies_finds_spenders() {
        let mut pool = Mempool::default();
        let parent_hash = ember_chain::hash::Hash256::of(b"parent");
        let child = Transaction::new(
            1,
            vec![TxInput {
                prev: OutPoint {
                    tx_hash: parent_hash,
                    index: 0,
                },
                witness: vec![],
                signature: vec![],
                sequence: 0,
            }],
            vec![TxOutput {
                value: DUST_THRESHOLD + 1000,
                script_pubkey: vec![],
                recipient_pubkey: vec![],
            }],
            0,
            0,
        );
        let child_id = pool.insert(child, 10_000, 0).unwrap();
        let deps = pool.dependencies(&parent_hash);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].txid, child_id);
    }
}
