use ember_chain::hash::Hash256;
use ember_chain::transparent::OutPoint;
use thiserror::Error;

/// Errors returned by [`crate::Mempool::insert`] (spec.md §4.6's admission
/// algorithm, steps 1-5).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    /// transaction {0} is already in the mempool
    #[error("transaction {0} is already in the mempool")]
    AlreadyPresent(Hash256),
    /// a coinbase transaction cannot enter the mempool
    #[error("a coinbase transaction cannot enter the mempool")]
    Coinbase,
    /// transaction has a dust output below the relay threshold
    #[error("transaction has a dust output below the relay threshold")]
    DustOutput,
    /// transaction size {size} exceeds the maximum of {max}
    #[error("transaction size {size} exceeds the maximum of {max}")]
    TooLarge { size: usize, max: usize },
    /// fee rate {fee_rate} is below the minimum relay fee rate of {minimum}
    #[error("fee rate {fee_rate} is below the minimum relay fee rate of {minimum}")]
    FeeTooLow { fee_rate: u64, minimum: u64 },
    /// input {0:?} is already spent by transaction {1} in the mempool
    #[error("input {0:?} is already spent by transaction {1} in the mempool")]
    Conflict(OutPoint, Hash256),
    /// the mempool is full and cannot free enough space for this transaction
    #[error("the mempool is full and cannot free enough space for this transaction")]
    Full,
}
