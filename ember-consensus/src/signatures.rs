//! Batch signature verification (spec.md §4.5: "within one block, all
//! signatures are collected and verified as a group"; spec.md §5: "may
//! internally parallelize over cores").
//!
//! Parallelized with `rayon`, the same crate the teacher workspace's
//! `zebra-network` uses for this exact purpose, independently picked up by
//! the `smellycoin-smellycoin` consensus/mining crates in the pack.

use ember_chain::crypto::SignatureAdapter;
use ember_chain::transaction::Transaction;
use ember_state::types::UtxoEntry;
use rayon::prelude::*;

use crate::error::BlockError;
use crate::transaction::sighash;

/// Verify every non-coinbase input's signature across `transactions` in
/// parallel, short-circuiting to the first failure found (reported with
/// `(tx_index, input_index)` for logging, per spec.md §7).
///
/// `resolved` holds, for each transaction, the `UtxoEntry` each of its
/// inputs spends, in input order (coinbase's entry is an empty slice).
pub fn verify_block<A: SignatureAdapter + Sync>(
    transactions: &[Transaction],
    resolved: &[Vec<UtxoEntry>],
) -> Result<(), BlockError> {
    transactions
        .par_iter()
        .zip(resolved.par_iter())
        .enumerate()
        .find_map_any(|(tx_index, (tx, spent))| {
            tx.inputs
                .iter()
                .zip(spent)
                .enumerate()
                .find_map(|(input_index, (input, entry))| {
                    let message = sighash::compute(tx, input_index, &entry.output);
                    let verifies = A::public_key_from_bytes(&entry.output.recipient_pubkey)
                        .zip(A::signature_from_bytes(&input.signature))
                        .is_some_and(|(public, signature)| A::verify(&public, message.as_bytes(), &signature));
                    (!verifies).then_some(BlockError::BadSignature { tx_index, input_index })
                })
        })
        .map_or(Ok(()), Err)
}
