//! Transactions (spec.md §3).

use ember_codec_derive::{Decode, Encode};
#[cfg(any(test, feature = "proptest-impl"))]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::cached::Cached;
use crate::codec::{CodecError, CompactInt, Decode, Encode};
use crate::hash::Hash256;
use crate::transparent::{TxInput, TxOutput};

/// A transaction: a set of inputs spending prior outputs and a set of new
/// outputs, timestamped and identified by the hash of its canonical
/// encoding (spec.md §3).
#[derive(Clone, Debug, Serialize, Deserialize, Encode, Decode)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    pub timestamp: u64,
    #[cfg_attr(any(test, feature = "proptest-impl"), proptest(value = "Cached::new()"))]
    hash: Cached<Hash256>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.lock_time == other.lock_time
            && self.timestamp == other.timestamp
    }
}
impl Eq for Transaction {}

impl Transaction {
    pub fn new(
        version: u32,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
        lock_time: u32,
        timestamp: u64,
    ) -> Transaction {
        Transaction {
            version,
            inputs,
            outputs,
            lock_time,
            timestamp,
            hash: Cached::new(),
        }
    }

    /// The hash of this transaction's canonical encoding; this is its
    /// identity (spec.md §3).
    pub fn hash(&self) -> Hash256 {
        if let Some(hash) = self.hash.value() {
            return hash;
        }
        Hash256::of(&self.encode_to_vec())
    }

    /// Caches `hash()`'s result, so future calls skip re-hashing. Callers
    /// that just decoded a transaction off the wire or out of the store
    /// should call this once with the hash they already computed while
    /// decoding, mirroring `block::Header`'s cached hash.
    pub fn cache_hash(&mut self, hash: Hash256) {
        self.hash.set(hash);
    }

    /// A transaction is coinbase iff it has exactly one input and that
    /// input is the coinbase sentinel (spec.md §3).
    pub fn is_coinbase(&self) -> bool {
        matches!(self.inputs.as_slice(), [only] if only.is_coinbase())
    }

    pub fn contains_coinbase_input(&self) -> bool {
        self.inputs.iter().any(TxInput::is_coinbase)
    }

    /// Sum of all output values. Does not validate against input sum; see
    /// `ember-consensus` for the fee/balance check.
    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Size of the canonical encoding, in bytes.
    pub fn len(&self) -> usize {
        4 + CompactInt::size(self.inputs.len())
            + self.inputs.iter().map(TxInput::len).sum::<usize>()
            + CompactInt::size(self.outputs.len())
            + self.outputs.iter().map(TxOutput::len).sum::<usize>()
            + 4
            + 8
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
