//! Proof-of-work target representation (spec.md §3, §4.8).
//!
//! `bits` is a compact mantissa/exponent encoding of a 256-bit target:
//! `target = mantissa << (8 * (exponent - 3))`. A header is PoW-valid iff
//! `hash(header) <= target`.

use primitive_types::U256;

use crate::codec::{CodecError, Decode, Encode};

/// The on-wire `bits` field: 1 exponent byte (MSB) + 3 mantissa bytes.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(proptest_derive::Arbitrary))]
pub struct CompactDifficulty(pub u32);

/// The expanded 256-bit target a block hash must not exceed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpandedDifficulty(pub U256);

/// The easiest allowed target (spec.md §4.8's implicit "genesis-easy"
/// bound): loose enough that an unmined genesis header satisfies it for
/// nearly any nonce, unlike Bitcoin's own far harder `0x1d00ffff` launch
/// difficulty.
pub const MAX_POW_TARGET: CompactDifficulty = CompactDifficulty(0x2100_ffff);

/// The hardest allowed target: smallest nonzero mantissa at the smallest
/// exponent, a generous floor so retargeting clamps never divide by zero.
pub const MIN_POW_TARGET: CompactDifficulty = CompactDifficulty(0x0300_0001);

impl CompactDifficulty {
    /// Expand this compact target to its full 256-bit value, per spec.md
    /// §3: `mantissa << (8 * (exponent - 3))`. Returns `None` for the
    /// negative-mantissa encodings Bitcoin disallows (high bit of the
    /// mantissa's top byte set).
    pub fn to_expanded(self) -> Option<ExpandedDifficulty> {
        let exponent = (self.0 >> 24) as u32;
        let mantissa = self.0 & 0x007f_ffff;
        if self.0 & 0x0080_0000 != 0 {
            return None;
        }
        if mantissa == 0 {
            return Some(ExpandedDifficulty(U256::zero()));
        }
        let mantissa = U256::from(mantissa);
        let target = if exponent <= 3 {
            mantissa >> (8 * (3 - exponent))
        } else {
            mantissa << (8 * (exponent - 3))
        };
        Some(ExpandedDifficulty(target))
    }

    /// The inverse of `to_expanded`'s target space: roughly
    /// `2^256 / (target + 1)`, used to accumulate `chain_work`.
    pub fn to_work(self) -> U256 {
        match self.to_expanded() {
            Some(ExpandedDifficulty(target)) if !target.is_zero() => {
                let target_plus_one = target.saturating_add(U256::one());
                (!U256::zero() - target_plus_one) / target_plus_one + U256::one()
            }
            _ => U256::zero(),
        }
    }
}

impl ExpandedDifficulty {
    /// Re-compact this target, rounding toward the nearest representable
    /// compact value (matching Bitcoin's `GetCompact`).
    pub fn to_compact(self) -> CompactDifficulty {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        let first_nonzero = bytes.iter().position(|&b| b != 0);
        let Some(first_nonzero) = first_nonzero else {
            return CompactDifficulty(0);
        };
        let significant = &bytes[first_nonzero..];
        let mut exponent = (32 - first_nonzero) as u32;
        let mut mantissa_bytes = [0u8; 3];
        if significant[0] & 0x80 != 0 {
            // Would be read as negative; shift right by a byte and bump
            // the exponent to compensate.
            mantissa_bytes[1] = significant[0];
            if significant.len() > 1 {
                mantissa_bytes[2] = significant[1];
            }
            exponent += 1;
        } else {
            for (i, b) in significant.iter().take(3).enumerate() {
                mantissa_bytes[i] = *b;
            }
        }
        let mantissa = u32::from_be_bytes([0, mantissa_bytes[0], mantissa_bytes[1], mantissa_bytes[2]]);
        CompactDifficulty((exponent << 24) | mantissa)
    }
}

impl Encode for CompactDifficulty {
    fn encode<W: std::io::Write>(&self, target: W) -> Result<(), std::io::Error> {
        self.0.encode(target)
    }
}

impl Decode for CompactDifficulty {
    fn decode<R: std::io::Read>(reader: R) -> Result<Self, CodecError> {
        Ok(CompactDifficulty(u32::decode(reader)?))
    }
}
