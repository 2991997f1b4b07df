//! Stateless and contextual transaction checks (spec.md §4.5), grounded on
//! the teacher's `zebra-consensus/src/transaction/check.rs`
//! (`has_inputs_and_outputs`) plus spec.md's contextual rules, which the
//! teacher's slice doesn't cover (its transaction checks are mostly
//! Zcash-shielded-pool-specific).

use std::collections::HashSet;

use ember_chain::crypto::SignatureAdapter;
use ember_chain::parameters::MAX_MONEY;
use ember_chain::transaction::Transaction;

use crate::error::TransactionError;
use crate::transaction::sighash;
use crate::utxo::UtxoLookup;

/// A lock_time below this is interpreted as a block height, at or above it
/// as a UNIX timestamp (the Bitcoin convention spec.md §4.5's "lock_time
/// semantics" refers to).
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// At least one input and one output (spec.md §3, §4.5).
pub fn has_inputs_and_outputs(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.inputs.is_empty() {
        Err(TransactionError::NoInputs)
    } else if tx.outputs.is_empty() {
        Err(TransactionError::NoOutputs)
    } else {
        Ok(())
    }
}

/// No two inputs spend the same outpoint (spec.md §4.5: "no duplicate
/// outpoints among inputs").
pub fn no_duplicate_inputs(tx: &Transaction) -> Result<(), TransactionError> {
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.prev) {
            return Err(TransactionError::DuplicateInput(input.prev));
        }
    }
    Ok(())
}

/// Every output value, and their sum, stay within MAX_MONEY (spec.md §4.5).
pub fn outputs_within_max_money(tx: &Transaction) -> Result<(), TransactionError> {
    let mut total: u128 = 0;
    for output in &tx.outputs {
        if output.value > MAX_MONEY {
            return Err(TransactionError::OutputExceedsMaxMoney(output.value));
        }
        total += output.value as u128;
    }
    if total > MAX_MONEY as u128 {
        return Err(TransactionError::OutputSumExceedsMaxMoney(
            total.min(u64::MAX as u128) as u64,
        ));
    }
    Ok(())
}

/// `lock_time` semantics (spec.md §4.5): final when `lock_time == 0`, or
/// when it names a height/time strictly in the past.
pub fn is_final(tx: &Transaction, height: u32, median_time_past: u64) -> Result<(), TransactionError> {
    if tx.lock_time == 0 {
        return Ok(());
    }
    let is_final = if tx.lock_time < LOCKTIME_THRESHOLD {
        tx.lock_time < height
    } else {
        (tx.lock_time as u64) < median_time_past
    };
    if is_final {
        Ok(())
    } else {
        Err(TransactionError::NonFinal)
    }
}

/// Look up every input's spent `UtxoEntry` in `view`, in input order,
/// failing on the first missing outpoint (spec.md §4.5: "every input
/// outpoint exists in the view").
pub fn resolve_inputs<L: UtxoLookup>(
    tx: &Transaction,
    view: &L,
) -> Result<Vec<ember_state::types::UtxoEntry>, TransactionError> {
    tx.inputs
        .iter()
        .map(|input| {
            view.lookup(&input.prev)
                .ok_or(TransactionError::InputMissing(input.prev))
        })
        .collect()
}

/// Every coinbase UTXO referenced by `spent` has matured (spec.md §4.5).
pub fn coinbase_maturity_is_valid(
    spent: &[ember_state::types::UtxoEntry],
    current_height: u32,
    coinbase_maturity: u32,
    tx: &Transaction,
) -> Result<(), TransactionError> {
    for (index, (entry, input)) in spent.iter().zip(&tx.inputs).enumerate() {
        if !entry.is_mature(current_height, coinbase_maturity) {
            return Err(TransactionError::ImmatureCoinbase {
                index,
                outpoint: input.prev,
                spendable_at: entry.height + coinbase_maturity,
            });
        }
    }
    Ok(())
}

/// Inputs must sum to at least the outputs; the difference is the fee
/// (spec.md §4.4: "Fee = Σ spent.value − Σ output.value").
pub fn fee(tx: &Transaction, spent: &[ember_state::types::UtxoEntry]) -> Result<u64, TransactionError> {
    let input_sum: u64 = spent.iter().map(|entry| entry.output.value).sum();
    let output_sum = tx.output_sum();
    input_sum
        .checked_sub(output_sum)
        .ok_or(TransactionError::InputsLessThanOutputs {
            inputs: input_sum,
            outputs: output_sum,
        })
}

/// Each non-coinbase input's signature verifies against the pubkey
/// embedded in the output it spends (spec.md §4.5).
pub fn signatures_are_valid<A: SignatureAdapter>(
    tx: &Transaction,
    spent: &[ember_state::types::UtxoEntry],
) -> Result<(), TransactionError> {
    for (index, (input, entry)) in tx.inputs.iter().zip(spent).enumerate() {
        let message = sighash::compute(tx, index, &entry.output);
        let public = A::public_key_from_bytes(&entry.output.recipient_pubkey)
            .ok_or(TransactionError::BadSignature { index })?;
        let signature = A::signature_from_bytes(&input.signature)
            .ok_or(TransactionError::BadSignature { index })?;
        if !A::verify(&public, message.as_bytes(), &signature) {
            return Err(TransactionError::BadSignature { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ember_chain::crypto::TestAdapter;
    use ember_chain::hash::Hash256;
    use ember_chain::transparent::{OutPoint, TxInput, TxOutput};
    use ember_state::types::UtxoEntry;

    use super::*;

    fn spending_tx(signature: Vec<u8>, prev: OutPoint) -> Transaction {
        Transaction::new(
            1,
            vec![TxInput {
                prev,
                witness: vec![],
                signature,
                sequence: 0,
            }],
            vec![TxOutput {
                value: 10,
                script_pubkey: vec![],
                recipient_pubkey: vec![0xAB; 32],
            }],
            0,
            1_700_000_000,
        )
    }

    #[test]
    fn rejects_empty_inputs_or_outputs() {
        let mut tx = spending_tx(vec![], OutPoint::coinbase_sentinel());
        tx.inputs.clear();
        assert_eq!(has_inputs_and_outputs(&tx), Err(TransactionError::NoInputs));
        let mut tx = spending_tx(vec![], OutPoint::coinbase_sentinel());
        tx.outputs.clear();
        assert_eq!(has_inputs_and_outputs(&tx), Err(TransactionError::NoOutputs));
    }

    #[test]
    fn rejects_duplicate_inputs() {
        let mut tx = spending_tx(vec![], OutPoint::coinbase_sentinel());
        tx.inputs.push(tx.inputs[0].clone());
        assert!(matches!(
            no_duplicate_inputs(&tx),
            Err(TransactionError::DuplicateInput(_))
        ));
    }

    #[test]
    fn lock_time_zero_is_always_final() {
        let tx = spending_tx(vec![], OutPoint::coinbase_sentinel());
        assert!(is_final(&tx, 0, 0).is_ok());
    }

    #[test]
    fn lock_time_as_height_is_respected() {
        let mut tx = spending_tx(vec![], OutPoint::coinbase_sentinel());
        tx.lock_time = 100;
        assert_eq!(is_final(&tx, 50, 0), Err(TransactionError::NonFinal));
        assert!(is_final(&tx, 150, 0).is_ok());
    }

    #[test]
    fn verifies_signature_against_embedded_pubkey() {
        let (pk, sk) = TestAdapter::generate();
        let prev = OutPoint {
            tx_hash: Hash256::of(b"prev"),
            index: 0,
        };
        let spent_output = TxOutput {
            value: 1000,
            script_pubkey: vec![],
            recipient_pubkey: TestAdapter::public_key_bytes(&pk),
        };
        let entry = UtxoEntry {
            output: spent_output.clone(),
            height: 1,
            is_coinbase: false,
        };
        let mut tx = spending_tx(vec![], prev);
        let message = sighash::compute(&tx, 0, &spent_output);
        let sig = TestAdapter::sign(&sk, message.as_bytes());
        tx.inputs[0].signature = TestAdapter::signature_bytes(&sig);

        signatures_are_valid::<TestAdapter>(&tx, &[entry.clone()]).unwrap();

        tx.inputs[0].signature = vec![0u8; 32];
        assert!(signatures_are_valid::<TestAdapter>(&tx, &[entry]).is_err());
    }
}
