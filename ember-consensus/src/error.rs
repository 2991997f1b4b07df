//! Consensus error types (spec.md §4.5, §7): every validation failure is a
//! typed, loggable error; the block or transaction that triggered it is
//! rejected in toto.

use ember_chain::hash::Hash256;
use ember_chain::transparent::OutPoint;
use ember_chain::work::difficulty::CompactDifficulty;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// transaction has no inputs
    #[error("transaction has no inputs")]
    NoInputs,
    /// transaction has no outputs
    #[error("transaction has no outputs")]
    NoOutputs,
    /// transaction spends the same outpoint {0:?} more than once
    #[error("transaction spends the same outpoint {0:?} more than once")]
    DuplicateInput(OutPoint),
    /// output value {0} exceeds MAX_MONEY
    #[error("output value {0} exceeds MAX_MONEY")]
    OutputExceedsMaxMoney(u64),
    /// the sum of output values {0} exceeds MAX_MONEY
    #[error("the sum of output values {0} exceeds MAX_MONEY")]
    OutputSumExceedsMaxMoney(u64),
    /// a coinbase input is present outside the block's first transaction
    #[error("a coinbase input is present outside the block's first transaction")]
    CoinbaseInputMisplaced,
    /// input {0:?} spends an outpoint absent from the UTXO view
    #[error("input {0:?} spends an outpoint absent from the UTXO view")]
    InputMissing(OutPoint),
    /// input {index} spends coinbase outpoint {outpoint:?} before it matures at height {spendable_at}
    #[error(
        "input {index} spends coinbase outpoint {outpoint:?} before it matures at height {spendable_at}"
    )]
    ImmatureCoinbase {
        index: usize,
        outpoint: OutPoint,
        spendable_at: u32,
    },
    /// signature on input {index} does not verify
    #[error("signature on input {index} does not verify")]
    BadSignature { index: usize },
    /// transaction is not final at the current height/median-time
    #[error("transaction is not final at the current height/median-time")]
    NonFinal,
    /// the sum of a transaction's inputs is less than the sum of its outputs
    #[error("the sum of a transaction's inputs ({inputs}) is less than its outputs ({outputs})")]
    InputsLessThanOutputs { inputs: u64, outputs: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// block has no transactions
    #[error("block has no transactions")]
    NoTransactions,
    /// the first transaction is not a coinbase transaction
    #[error("the first transaction is not a coinbase transaction")]
    CoinbaseNotFirst,
    /// more than one coinbase transaction is present
    #[error("more than one coinbase transaction is present")]
    MultipleCoinbase,
    /// computed merkle root {actual} does not match header's {expected}
    #[error("computed merkle root {actual} does not match header's {expected}")]
    BadMerkleRoot { expected: Hash256, actual: Hash256 },
    /// duplicate transaction {0} in block
    #[error("duplicate transaction {0} in block")]
    DuplicateTransaction(Hash256),
    /// `bits` {0:?} decodes to a negative-mantissa target
    #[error("bits {0:?} decodes to a negative-mantissa target")]
    InvalidDifficulty(CompactDifficulty),
    /// target implied by `bits` exceeds the network's PoW limit
    #[error("target implied by bits exceeds the network's PoW limit")]
    TargetDifficultyLimit,
    /// block hash does not satisfy its own `bits` target
    #[error("block hash does not satisfy its own bits target")]
    DifficultyFilter,
    /// `bits` {actual:?} does not match the expected retarget value {expected:?}
    #[error("bits {actual:?} does not match the expected retarget value {expected:?}")]
    BadRetarget {
        expected: CompactDifficulty,
        actual: CompactDifficulty,
    },
    /// header timestamp is more than the allowed drift ahead of now
    #[error("header timestamp is more than the allowed drift ahead of now")]
    TimeTooFarInFuture,
    /// header timestamp does not exceed the median of the previous blocks
    #[error("header timestamp does not exceed the median of the previous blocks")]
    TimestampNotAfterMedian,
    /// signature on transaction {tx_index} input {input_index} does not verify
    #[error("signature on transaction {tx_index} input {input_index} does not verify")]
    BadSignature { tx_index: usize, input_index: usize },
    /// coinbase output total {actual} does not equal the expected subsidy plus fees {expected}
    #[error("coinbase output total {actual} does not equal the expected subsidy plus fees {expected}")]
    BadCoinbaseReward { expected: u64, actual: u64 },
    /// block at checkpoint height {height} has hash {actual} but the checkpoint requires {expected}
    #[error("block at checkpoint height {height} has hash {actual} but the checkpoint requires {expected}")]
    CheckpointMismatch {
        height: u32,
        expected: Hash256,
        actual: Hash256,
    },
    /// {0}
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
