//! Peer-to-peer networking
//!
//! One request per TCP connection: the client writes a JSON [`Package`],
//! the server answers with one [`Reply`] and closes. Ledger values inside a
//! package are bincode bytes.

pub mod bootstrap;
pub mod client;
pub mod message;
pub mod peers;
pub mod server;

pub use bootstrap::Bootstrapper;
pub use client::NodeClient;
pub use message::{Message, Package, Reply};
pub use peers::PeerSenders;
pub use server::Server;
