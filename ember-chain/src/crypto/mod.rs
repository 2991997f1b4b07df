//! Crypto adapter (spec.md §4.2): `hash256`, the pluggable post-quantum
//! signature scheme, and Bech32m address derivation.

mod dilithium;
#[cfg(any(test, feature = "proptest-impl"))]
mod test_adapter;

use bech32::{ToBase32, Variant};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub use dilithium::DilithiumAdapter;
#[cfg(any(test, feature = "proptest-impl"))]
pub use test_adapter::TestAdapter;

use crate::hash::Hash256;

/// `hash256(bytes)`: double SHA-256, the collision-resistant hash every
/// participant must agree on (spec.md §4.2).
pub fn hash256(bytes: &[u8]) -> Hash256 {
    Hash256::of(bytes)
}

/// Human-readable prefix for every Ember address (spec.md §4.2).
pub const ADDRESS_HRP: &str = "int1";

/// A pluggable post-quantum signature scheme. Key and signature lengths are
/// consensus-critical constants (spec.md §4.2, §9); swapping `SignatureAdapter`
/// implementations is how the node stays ahead of an unsettled PQ ecosystem.
pub trait SignatureAdapter {
    type PublicKey: Clone;
    type SecretKey: Clone;
    type Signature: Clone;

    const PUBLIC_KEY_LEN: usize;
    const SIGNATURE_LEN: usize;

    fn generate() -> (Self::PublicKey, Self::SecretKey);
    fn sign(secret: &Self::SecretKey, message: &[u8]) -> Self::Signature;
    fn verify(public: &Self::PublicKey, message: &[u8], signature: &Self::Signature) -> bool;

    fn public_key_bytes(public: &Self::PublicKey) -> Vec<u8>;
    fn public_key_from_bytes(bytes: &[u8]) -> Option<Self::PublicKey>;
    fn signature_bytes(signature: &Self::Signature) -> Vec<u8>;
    fn signature_from_bytes(bytes: &[u8]) -> Option<Self::Signature>;
}

/// Derive a Bech32m address from a raw public key: `bech32m(ripemd160(sha256(pubkey)))`
/// with human-readable prefix `int1` (spec.md §4.2).
pub fn address(pubkey_bytes: &[u8]) -> String {
    let sha = Sha256::digest(pubkey_bytes);
    let hash160 = Ripemd160::digest(sha);
    bech32::encode(ADDRESS_HRP, hash160.to_base32(), Variant::Bech32m)
        .expect("hrp is ASCII and payload length is well within bech32 limits")
}

/// Recover the 20-byte hash embedded in an address, if `addr` is a
/// well-formed Bech32m address with the expected human-readable prefix.
pub fn address_hash160(addr: &str) -> Option<[u8; 20]> {
    use bech32::FromBase32;

    let (hrp, data, variant) = bech32::decode(addr).ok()?;
    if hrp != ADDRESS_HRP || variant != Variant::Bech32m {
        return None;
    }
    let bytes = Vec::<u8>::from_base32(&data).ok()?;
    if bytes.len() != 20 {
        return None;
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Some(out)
}
