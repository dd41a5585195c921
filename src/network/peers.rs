use crate::network::NodeClient;
use std::sync::RwLock;

/// The set of peer listeners a node broadcasts to, without duplicates,
/// in insertion order.
pub struct PeerSenders {
    inner: RwLock<Vec<NodeClient>>,
}

impl Default for PeerSenders {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerSenders {
    pub fn new() -> PeerSenders {
        PeerSenders {
            inner: RwLock::new(vec![]),
        }
    }

    /// Returns false if a sender for the same endpoint is already known
    pub fn add_sender(&self, address: &str, port: u16) -> bool {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer senders - this should never happen");
        let sender = NodeClient::new(address, port);
        if inner.contains(&sender) {
            return false;
        }
        inner.push(sender);
        true
    }

    pub fn get_senders(&self) -> Vec<NodeClient> {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer senders - this should never happen")
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer senders - this should never happen")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer senders - this should never happen")
            .is_empty()
    }
}
