//! Node-level error taxonomy (spec.md §7): wraps every lower-layer error
//! and adds the failures only a whole node can produce (reorg depth,
//! checkpoint violations, contention).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    /// {0}
    #[error(transparent)]
    Block(#[from] ember_consensus::BlockError),
    /// {0}
    #[error(transparent)]
    Transaction(#[from] ember_consensus::TransactionError),
    /// {0}
    #[error(transparent)]
    Store(#[from] ember_state::StoreError),
    /// {0}
    #[error(transparent)]
    Mempool(#[from] ember_mempool::MempoolError),
    /// a reorg would disconnect {depth} blocks, more than the allowed {max}
    #[error("a reorg would disconnect {depth} blocks, more than the allowed {max}")]
    ReorgTooDeep { depth: u32, max: u32 },
    /// block at checkpointed height {height} does not match the checkpoint and was rejected before validation
    #[error("block at checkpointed height {height} does not match the checkpoint and was rejected before validation")]
    CheckpointViolation { height: u32 },
    /// the chain manager's tip-transition lock is held by another submission
    #[error("the chain manager's tip-transition lock is held by another submission")]
    Busy,
}
