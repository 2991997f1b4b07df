//! The production [`SignatureAdapter`]: CRYSTALS-Dilithium5 (ML-DSA) via
//! `pqcrypto-dilithium`. Sizes match spec.md §4.2's "public key ≈ 2.5 KiB,
//! signature ≈ 4.6 KiB" note almost exactly (2592 B / 4627 B).

use pqcrypto_dilithium::dilithium5;
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _};

use super::SignatureAdapter;

pub struct DilithiumAdapter;

impl SignatureAdapter for DilithiumAdapter {
    type PublicKey = dilithium5::PublicKey;
    type SecretKey = dilithium5::SecretKey;
    type Signature = dilithium5::DetachedSignature;

    const PUBLIC_KEY_LEN: usize = 2592;
    const SIGNATURE_LEN: usize = 4627;

    fn generate() -> (Self::PublicKey, Self::SecretKey) {
        dilithium5::keypair()
    }

    fn sign(secret: &Self::SecretKey, message: &[u8]) -> Self::Signature {
        dilithium5::detached_sign(message, secret)
    }

    fn verify(public: &Self::PublicKey, message: &[u8], signature: &Self::Signature) -> bool {
        dilithium5::verify_detached_signature(signature, message, public).is_ok()
    }

    fn public_key_bytes(public: &Self::PublicKey) -> Vec<u8> {
        public.as_bytes().to_vec()
    }

    fn public_key_from_bytes(bytes: &[u8]) -> Option<Self::PublicKey> {
        dilithium5::PublicKey::from_bytes(bytes).ok()
    }

    fn signature_bytes(signature: &Self::Signature) -> Vec<u8> {
        signature.as_bytes().to_vec()
    }

    fn signature_from_bytes(bytes: &[u8]) -> Option<Self::Signature> {
        dilithium5::DetachedSignature::from_bytes(bytes).ok()
    }
}
