use thiserror::Error;

/// Errors produced by the store (spec.md §4.3, §7).
#[derive(Error, Debug)]
pub enum StoreError {
    /// the underlying sled database returned an error
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    /// a stored value failed to decode; the store is corrupt
    #[error("corrupt store entry at key {key}: {source}")]
    Corruption {
        key: String,
        #[source]
        source: ember_chain::codec::CodecError,
    },
    /// a stored value's header carries a magic/version this build doesn't
    /// support — an ordinary consequence of opening an existing database
    /// with different node software, not corruption
    #[error("store entry at key {key} was written by an incompatible version")]
    VersionMismatch { key: String },
    /// a batch referenced an outpoint with no matching UTXO entry
    #[error("outpoint {0:?} has no UTXO entry")]
    MissingUtxo(ember_chain::transparent::OutPoint),
}
