//! # Peer Ledger - A Small Peer-to-Peer Ledger Simulator
//!
//! Every node in my network owns a wallet, mines blocks of at most five
//! transactions, and gossips blocks and transactions to its peers over plain
//! TCP. Nothing is persisted; the whole ledger lives in memory.
//!
//! ## What I Built
//! - **UTXO Model**: value moves as signed transfers that consume and create flows
//! - **Proof-of-Work**: leading-zero hex hashes at a fixed difficulty
//! - **Fork Resolution**: a strictly longer chain that verifies from scratch wins
//! - **Node State Machine**: mining, block acceptance and chain replacement behind one lock
//! - **Peer Protocol**: one JSON request per connection, ledger payloads as bincode bytes
//! - **Bootstrap Host**: wires a set of fresh nodes together and exchanges contacts
//!
//! ## How I Organized My Code
//! - `core/`: transactions, blocks, merkle root, proof-of-work, the chain
//! - `storage/`: the UTXO set and the pending transaction pool
//! - `wallet/`: key pair, coin selection, signing, contacts
//! - `node/`: the `PeerNode` every other part talks to
//! - `network/`: wire messages, client, threaded server, bootstrap host
//! - `controller/` and `view/`: periodic tasks and where their output goes
//! - `config/`: environment settings and the optional TOML file
//! - `utils/`: hashing, ECDSA P-256, timestamps, bincode helpers
//! - `cli/`: command-line interface
//!
//! ## When I Need to Understand Something
//! 1. Start with `node/peer_node.rs` to see what a node does
//! 2. Look at `core/block.rs` for collection and mining
//! 3. Check `core/blockchain.rs` for verification and replay
//! 4. Review `network/server.rs` for the message table

pub mod cli;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod storage;
pub mod utils;
pub mod view;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, PeerArg};
pub use config::{Config, NodeSettings, ScheduleSettings, GLOBAL_CONFIG};
pub use controller::Controller;
pub use core::{
    Block, Blockchain, MerkleTree, NormalTransaction, ProofOfWork, RewardTransaction, Transaction,
    TransactionContract, TransactionFlow, TransactionState, BLOCK_MAX_CAPACITY, BLOCK_REWARD,
    DEFAULT_DIFFICULTY, MINIMUM_INPUT, MINIMUM_VALUE,
};
pub use error::{BlockchainError, Result};
pub use network::{Bootstrapper, Message, NodeClient, Package, PeerSenders, Reply, Server};
pub use node::PeerNode;
pub use storage::{TransactionPool, UTXOSet};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, sha256_digest, sha256_hex,
};
pub use view::{BufferedView, DisplaySink, LogView};
pub use wallet::{validate_address, ContactMap, Wallet};
