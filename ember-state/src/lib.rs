//! The embedded, atomically-batched key-value store behind every persisted
//! chain fact: blocks, the per-block index, the height index, transaction
//! locations, the UTXO set, its address reverse-index, and the chain tip
//! (spec.md §4.3).

mod batch;
pub mod config;
pub mod error;
mod keys;
mod store;
pub mod types;

pub use batch::Batch;
pub use config::Config;
pub use error::StoreError;
pub use store::Store;
