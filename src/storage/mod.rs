//! In-memory ledger state
//!
//! The UTXO set and the pool of pending transactions. Nothing here is
//! persisted; a node rebuilds both from its chain when it has to.

pub mod memory_pool;
pub mod utxo_set;

pub use memory_pool::TransactionPool;
pub use utxo_set::UTXOSet;
