//! Node consensus state machine
//!
//! A `PeerNode` owns a wallet, its view of the chain, the matching UTXO set,
//! the pending pool and the contact directory. Servers and periodic tasks
//! drive it through plain method calls.

pub mod peer_node;

pub use peer_node::PeerNode;
