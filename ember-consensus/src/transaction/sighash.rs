//! The deterministically constructed message a transaction's signatures
//! commit to (spec.md §4.5: "signature over a deterministically
//! constructed sighash verifies against the pubkey embedded in the spent
//! output's `script_pubkey`").
//!
//! There is no script VM in this design (a Non-goal), so every input signs
//! the same message: the transaction with all `signature` fields blanked,
//! bound to the specific input being signed and the output it spends. This
//! is the simplest binding that still prevents one input's signature being
//! replayed against another input or another transaction.

use ember_chain::codec::Encode;
use ember_chain::crypto::hash256;
use ember_chain::hash::Hash256;
use ember_chain::transaction::Transaction;
use ember_chain::transparent::TxOutput;

/// The message signed for `input_index`, given the output it spends.
pub fn compute(tx: &Transaction, input_index: usize, spent_output: &TxOutput) -> Hash256 {
    let mut blanked = tx.clone();
    for input in blanked.inputs.iter_mut() {
        input.signature.clear();
    }

    let mut buf = blanked.encode_to_vec();
    buf.extend_from_slice(&(input_index as u32).to_le_bytes());
    buf.extend_from_slice(&spent_output.value.to_le_bytes());
    buf.extend_from_slice(&spent_output.script_pubkey);
    hash256(&buf)
}
