use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{sha256d, CodecError, Decode, Encode};

/// A 32-byte content hash, used for transaction ids and block ids alike.
///
/// Ordered byte-lexicographically (big-endian), which is what lets a
/// `Hash256` be compared directly against a PoW target (spec.md §3).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const fn zero() -> Self {
        Hash256([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `hash256` applied to an arbitrary byte slice (spec.md §4.2).
    pub fn of(bytes: &[u8]) -> Self {
        Hash256(sha256d::hash(bytes))
    }
}

impl Default for Hash256 {
    fn default() -> Self {
        Hash256::zero()
    }
}

impl Encode for Hash256 {
    fn encode<W: std::io::Write>(&self, target: W) -> Result<(), std::io::Error> {
        self.0.encode(target)
    }
}

impl Decode for Hash256 {
    fn decode<R: std::io::Read>(reader: R) -> Result<Self, CodecError> {
        Ok(Hash256(<[u8; 32]>::decode(reader)?))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "Hash256(\"{}\")", hex::encode(reversed))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl FromStr for Hash256 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = hex::decode(s).map_err(|_| CodecError::FieldOutOfRange)?;
        if bytes.len() != 32 {
            return Err(CodecError::FieldOutOfRange);
        }
        bytes.reverse();
        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Hash256(array))
    }
}

#[cfg(any(test, feature = "proptest-impl"))]
impl proptest::arbitrary::Arbitrary for Hash256 {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        use proptest::prelude::*;
        proptest::collection::vec(any::<u8>(), 32)
            .prop_map(|v| {
                let mut array = [0u8; 32];
                array.copy_from_slice(&v);
                Hash256(array)
            })
            .boxed()
    }
}
