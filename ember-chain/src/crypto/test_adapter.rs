//! A deterministic signature double for tests (spec.md §9): real Dilithium
//! keygen/signing is slow enough to dominate test suite wall-clock, so tests
//! that don't specifically exercise cryptography use this instead.

use crate::hash::Hash256;

use super::SignatureAdapter;

pub struct TestAdapter;

/// A "secret key" is just the seed; the "public key" and "signature" are
/// both derived from it with `hash256`, so verification is a pure function
/// of public data and needs no real asymmetric cryptography.
impl SignatureAdapter for TestAdapter {
    type PublicKey = [u8; 32];
    type SecretKey = [u8; 32];
    type Signature = [u8; 32];

    const PUBLIC_KEY_LEN: usize = 32;
    const SIGNATURE_LEN: usize = 32;

    fn generate() -> (Self::PublicKey, Self::SecretKey) {
        let secret: [u8; 32] = rand::random();
        let public = Hash256::of(&secret).0;
        (public, secret)
    }

    fn sign(secret: &Self::SecretKey, message: &[u8]) -> Self::Signature {
        let public = Hash256::of(secret).0;
        let mut buf = Vec::with_capacity(32 + message.len());
        buf.extend_from_slice(&public);
        buf.extend_from_slice(message);
        Hash256::of(&buf).0
    }

    fn verify(public: &Self::PublicKey, message: &[u8], signature: &Self::Signature) -> bool {
        let mut buf = Vec::with_capacity(32 + message.len());
        buf.extend_from_slice(public);
        buf.extend_from_slice(message);
        &Hash256::of(&buf).0 == signature
    }

    fn public_key_bytes(public: &Self::PublicKey) -> Vec<u8> {
        public.to_vec()
    }

    fn public_key_from_bytes(bytes: &[u8]) -> Option<Self::PublicKey> {
        bytes.try_into().ok()
    }

    fn signature_bytes(signature: &Self::Signature) -> Vec<u8> {
        signature.to_vec()
    }

    fn signature_from_bytes(bytes: &[u8]) -> Option<Self::Signature> {
        bytes.try_into().ok()
    }
}
