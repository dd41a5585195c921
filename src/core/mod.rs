//! Core ledger functionality
//!
//! Transactions, blocks, the chain, proof-of-work and the merkle digest,
//! plus the monetary constants they share.

pub mod block;
pub mod blockchain;
pub mod merkle;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use blockchain::Blockchain;
pub use merkle::MerkleTree;
pub use monetary::{
    BLOCK_MAX_CAPACITY, BLOCK_REWARD, DEFAULT_DIFFICULTY, GENESIS_PREVIOUS_HASH, MINIMUM_INPUT,
    MINIMUM_VALUE, VALUE_EPSILON,
};
pub use proof_of_work::ProofOfWork;
pub use transaction::{
    NormalTransaction, RewardTransaction, Transaction, TransactionContract, TransactionFlow,
    TransactionState,
};
