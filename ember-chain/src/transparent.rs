//! Transaction inputs and outputs (spec.md §3).

use ember_codec_derive::{Decode, Encode};
#[cfg(any(test, feature = "proptest-impl"))]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, CompactInt, Decode, Encode};
use crate::hash::Hash256;

/// A particular transaction output reference.
///
/// Identity-equal iff both fields are equal; a stable `Hash` impl (derived
/// below, over the 36-byte concatenation) makes this usable as a map key.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Encode, Decode,
)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct OutPoint {
    pub tx_hash: Hash256,
    pub index: u32,
}

impl OutPoint {
    pub const fn len() -> usize {
        36
    }

    /// The sentinel `OutPoint` that marks a coinbase input (spec.md §3).
    pub fn coinbase_sentinel() -> Self {
        OutPoint {
            tx_hash: Hash256::zero(),
            index: 0xFFFF_FFFF,
        }
    }

    pub fn is_coinbase_sentinel(&self) -> bool {
        *self == Self::coinbase_sentinel()
    }
}

/// A transparent input to a transaction: a reference to a previous output,
/// a spending predicate satisfied by `witness`/`signature`, and a sequence
/// number. A coinbase input is the one whose `prev` is the coinbase
/// sentinel `OutPoint` (spec.md §3); it carries arbitrary miner-chosen bytes
/// in `witness` instead of a real spending predicate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct TxInput {
    pub prev: OutPoint,
    pub witness: Vec<u8>,
    pub signature: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    pub fn is_coinbase(&self) -> bool {
        self.prev.is_coinbase_sentinel()
    }

    pub fn len(&self) -> usize {
        OutPoint::len()
            + CompactInt::size(self.witness.len())
            + self.witness.len()
            + CompactInt::size(self.signature.len())
            + self.signature.len()
            + 4
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A transparent output of a transaction: an amount, an opaque spending
/// predicate (`script_pubkey`), and the recipient's raw public key (needed
/// to verify a later spend's signature without a separate key-reveal step).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
    pub recipient_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn len(&self) -> usize {
        8 + CompactInt::size(self.script_pubkey.len())
            + self.script_pubkey.len()
            + CompactInt::size(self.recipient_pubkey.len())
            + self.recipient_pubkey.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Dust threshold: non-coinbase outputs below this are rejected from
    /// the mempool (spec.md §3).
    pub const DUST_THRESHOLD: u64 = 1000;

    pub fn is_dust(&self) -> bool {
        self.value < Self::DUST_THRESHOLD
    }
}
