use crate::config::BootstrapEntry;
use crate::error::Result;
use crate::network::message::Message;
use crate::network::NodeClient;
use crate::wallet::ContactMap;
use log::{info, warn};
use std::thread;
use std::time::Duration;

const DEFAULT_RETRY_PAUSE: u64 = 500;

/// Host that wires a fresh set of nodes together and then steps aside.
///
/// For every target, in order: tell it which peer listeners to open, tell
/// it which peer ports to send to, ask for its contact, and finally hand
/// every target the collected contact map. Each send is retried until the
/// target acknowledges it.
pub struct Bootstrapper {
    targets: Vec<BootstrapEntry>,
    contacts: ContactMap,
    retry_pause: Duration,
}

impl Bootstrapper {
    pub fn new(targets: Vec<BootstrapEntry>) -> Bootstrapper {
        Bootstrapper {
            targets,
            contacts: ContactMap::new(),
            retry_pause: Duration::from_millis(DEFAULT_RETRY_PAUSE),
        }
    }

    pub fn with_retry_pause(mut self, retry_pause: Duration) -> Bootstrapper {
        self.retry_pause = retry_pause;
        self
    }

    pub fn get_contacts(&self) -> &ContactMap {
        &self.contacts
    }

    pub fn start(&mut self) {
        self.send_server_ports();
        self.send_client_ports();
        self.request_contacts();
        self.send_contact_map();
    }

    fn send_server_ports(&self) {
        for target in &self.targets {
            let client = NodeClient::new(&target.address, target.port);
            self.retry(&client, |c| {
                Ok(c.send_server_ports(&target.server_ports)? == Message::Success)
            });
        }
        info!("Peer server ports sent!");
    }

    fn send_client_ports(&self) {
        for target in &self.targets {
            let client = NodeClient::new(&target.address, target.port);
            self.retry(&client, |c| {
                Ok(c.send_client_ports(&target.client_ports)? == Message::Success)
            });
        }
        info!("Peer client ports sent!");
    }

    fn request_contacts(&mut self) {
        let mut collected = Vec::new();
        for target in &self.targets {
            let client = NodeClient::new(&target.address, target.port);
            self.retry(&client, |c| {
                collected.push(c.send_contact_request()?);
                Ok(true)
            });
        }
        for (name, address) in collected {
            self.contacts.add(&name, &address);
        }
        info!("Contacts collected: {}", self.contacts.len());
    }

    /// A `FAIL` answer is logged but not retried
    fn send_contact_map(&self) {
        for target in &self.targets {
            let client = NodeClient::new(&target.address, target.port);
            self.retry(&client, |c| {
                if c.send_contact_map(&self.contacts)? == Message::Fail {
                    warn!("Cannot update ContactMap in {c}");
                }
                Ok(true)
            });
        }
        info!("ContactMap updated!");
    }

    /// Calls `send` until it reports success. Connection errors and
    /// unacknowledged sends are retried after a pause.
    fn retry<F>(&self, client: &NodeClient, mut send: F)
    where
        F: FnMut(&NodeClient) -> Result<bool>,
    {
        loop {
            match send(client) {
                Ok(true) => return,
                Ok(false) => warn!("{client} did not acknowledge, retrying"),
                Err(e) => warn!("Connection error. Failed connecting to {client}: {e}"),
            }
            thread::sleep(self.retry_pause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_targets_is_a_no_op() {
        let mut host = Bootstrapper::new(vec![]).with_retry_pause(Duration::from_millis(1));
        host.start();
        assert!(host.get_contacts().is_empty());
    }
}
