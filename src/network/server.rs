use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::message::{Message, Package, Reply};
use crate::node::PeerNode;
use crate::utils::serialization::decode_payload;
use crate::view::{banner, DisplaySink};
use crate::wallet::ContactMap;
use log::{debug, error, info, warn};
use serde_json::Deserializer;
use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 60;

/// Listener side of a node.
///
/// Every accepted connection gets its own thread, reads exactly one
/// [`Package`], writes one [`Reply`] and closes. The same server can listen
/// on several ports; `SERVER_PORT` requests open more of them.
#[derive(Clone)]
pub struct Server {
    node: Arc<PeerNode>,
    view: Arc<dyn DisplaySink>,
    host: String,
}

impl Server {
    pub fn new(node: Arc<PeerNode>, view: Arc<dyn DisplaySink>) -> Self {
        Self {
            node,
            view,
            host: GLOBAL_CONFIG.get_listen_host(),
        }
    }

    /// Host used for listeners opened on request
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Bind `addr` and serve on the calling thread
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = Self::bind(addr)?;
        info!("Server listening on {addr}");
        self.serve(listener);
        Ok(())
    }

    /// Bind `addr` and serve on a background thread. Returns the bound
    /// address, which matters when `addr` asks for port 0.
    pub fn spawn(&self, addr: &str) -> Result<SocketAddr> {
        let listener = Self::bind(addr)?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {local_addr}");

        let server = self.clone();
        thread::spawn(move || server.serve(listener));
        Ok(local_addr)
    }

    fn bind(addr: &str) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))
    }

    fn serve(&self, listener: TcpListener) {
        let local_port = listener.local_addr().map(|a| a.port()).unwrap_or_default();

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let server = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream, peer_addr, local_port) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
    }

    fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        local_port: u16,
    ) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        let reader = BufReader::new(&stream);
        let pkg = match Deserializer::from_reader(reader).into_iter::<Package>().next() {
            Some(pkg) => pkg.map_err(|e| {
                BlockchainError::Network(format!("Failed to deserialize package: {e}"))
            })?,
            None => {
                debug!("{peer_addr} closed without sending a package");
                return Ok(());
            }
        };

        debug!(
            "Received {} from {peer_addr} (sender: {})",
            pkg.kind(),
            pkg.addr_from()
        );

        let reply = match self.process_message(pkg, local_port) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Error processing message from {peer_addr}: {e}");
                Reply::Status(Message::Fail)
            }
        };

        serde_json::to_writer(&stream, &reply)
            .map_err(|e| BlockchainError::Network(format!("Failed to send reply: {e}")))?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn process_message(&self, pkg: Package, local_port: u16) -> Result<Reply> {
        match pkg {
            Package::Transaction { transaction, .. } => {
                self.handle_transaction(&transaction, local_port)
            }
            Package::Block { block, .. } => self.handle_block(&block, local_port),
            Package::Blockchain { blockchain, .. } => {
                self.handle_blockchain(&blockchain, local_port)
            }
            Package::BlockchainRequest { .. } => Ok(Reply::Blockchain {
                blockchain: self.node.get_block_chain().serialize()?,
            }),
            Package::ContactRequest { .. } => Ok(Reply::Contact {
                name: self.node.get_owner_name().to_string(),
                address: self.node.get_address(),
            }),
            Package::ContactMap { contacts, .. } => self.handle_contact_map(&contacts),
            Package::ServerPort { ports, .. } => Ok(self.handle_server_ports(&ports)),
            Package::ClientPort { ports, .. } => Ok(self.handle_client_ports(&ports)),
        }
    }

    fn handle_transaction(&self, data: &[u8], local_port: u16) -> Result<Reply> {
        let transaction: Transaction = decode_payload(data, "transaction")?;
        let text = format!(
            "{}\nNew transaction received from Port {local_port}:\n{transaction}",
            banner("RECEIVED NEW TRANSACTION")
        );

        let updated = self.node.update_transaction_pool(transaction);
        self.view.print_received_log(&text);
        Ok(status(updated))
    }

    /// A block that does not extend my tip but is internally sound makes me
    /// ask the sender for its whole chain.
    fn handle_block(&self, data: &[u8], local_port: u16) -> Result<Reply> {
        let block: Block = decode_payload(data, "block")?;
        let text = format!("{block}");

        let reply = if self.node.update_block_chain(block.clone()) {
            Reply::Status(Message::Success)
        } else if self.node.verify_new_block_self_hash(&block) {
            Reply::Status(Message::BlockchainRequest)
        } else {
            Reply::Status(Message::Fail)
        };

        self.view.print_received_log(&format!(
            "{}\nNew block(height = {}) received from Port {local_port}:\n{text}",
            banner("RECEIVED NEW BLOCK"),
            self.node.chain_len()
        ));
        Ok(reply)
    }

    fn handle_blockchain(&self, data: &[u8], local_port: u16) -> Result<Reply> {
        let blockchain: Blockchain = decode_payload(data, "blockchain")?;
        let text = format!(
            "{}\nNew blockchain received from Port {local_port}:\n{blockchain}",
            banner("RECEIVED NEW BLOCKCHAIN")
        );

        let updated = self.node.replace_block_chain(blockchain);
        self.view.print_received_log(&text);
        Ok(status(updated))
    }

    fn handle_contact_map(&self, data: &[u8]) -> Result<Reply> {
        let contacts: ContactMap = decode_payload(data, "contact map")?;
        let added = self.node.merge_contacts(&contacts);
        info!("ContactMap updated:\n{}", self.node.get_contacts());
        Ok(status(added))
    }

    fn handle_server_ports(&self, ports: &[u16]) -> Reply {
        for port in ports {
            let addr = format!("{}:{port}", self.host);
            if let Err(e) = self.spawn(&addr) {
                error!("Failed to open peer listener on {addr}: {e}");
            }
        }
        info!("Peer listeners updated: {ports:?}");
        Reply::Status(Message::Success)
    }

    fn handle_client_ports(&self, ports: &[u16]) -> Reply {
        for port in ports {
            self.node.add_peer_sender_port(*port);
        }
        let senders: Vec<String> = self
            .node
            .get_peer_senders()
            .iter()
            .map(|sender| sender.to_string())
            .collect();
        info!("Peer senders updated: {}", senders.join(", "));
        Reply::Status(Message::Success)
    }
}

fn status(ok: bool) -> Reply {
    if ok {
        Reply::Status(Message::Success)
    } else {
        Reply::Status(Message::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeClient;
    use crate::view::BufferedView;

    fn start(name: &str) -> (Arc<PeerNode>, Arc<BufferedView>, NodeClient) {
        let node = Arc::new(PeerNode::with_difficulty(name, 1).unwrap());
        let view = Arc::new(BufferedView::new());
        let server = Server::new(Arc::clone(&node), view.clone()).with_host("127.0.0.1");
        let addr = server.spawn("127.0.0.1:0").unwrap();
        (node, view, NodeClient::new("127.0.0.1", addr.port()))
    }

    #[test]
    fn test_contact_request() {
        let (node, _, client) = start("alice");

        let (name, address) = client.send_contact_request().unwrap();
        assert_eq!(name, "alice");
        assert_eq!(address, node.get_address());
    }

    #[test]
    fn test_transaction_admission_and_log() {
        let (node, view, client) = start("alice");
        let tx = Transaction::new_reward("bob").unwrap();

        assert_eq!(client.send_transaction(&tx).unwrap(), Message::Success);
        assert_eq!(client.send_transaction(&tx).unwrap(), Message::Fail);
        assert_eq!(node.get_transaction_pool().len(), 1);
        assert!(view.received()[0].contains("RECEIVED NEW TRANSACTION"));
    }

    /// Sends `pkg` as is, bypassing the typed client helpers
    fn send_raw(client: &NodeClient, pkg: &Package) -> Reply {
        let addr: SocketAddr = client.get_addr().parse().unwrap();
        let stream = TcpStream::connect(addr).unwrap();
        serde_json::to_writer(&stream, pkg).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        Deserializer::from_reader(BufReader::new(&stream))
            .into_iter::<Reply>()
            .next()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_malformed_payload_gets_fail() {
        let (_, _, client) = start("alice");
        let pkg = Package::Block {
            addr_from: "127.0.0.1:1".to_string(),
            block: vec![1, 2, 3],
        };

        assert_eq!(send_raw(&client, &pkg), Reply::Status(Message::Fail));
    }

    #[test]
    fn test_oversized_length_prefix_gets_fail_and_node_keeps_serving() {
        let (node, _, client) = start("alice");
        let mut blockchain = vec![0xFD];
        blockchain.extend_from_slice(&(1u64 << 42).to_le_bytes());
        let pkg = Package::Blockchain {
            addr_from: "127.0.0.1:1".to_string(),
            blockchain,
        };

        assert_eq!(send_raw(&client, &pkg), Reply::Status(Message::Fail));

        let (name, _) = client.send_contact_request().unwrap();
        assert_eq!(name, "alice");
        assert_eq!(node.chain_len(), 0);
    }

    #[test]
    fn test_client_ports_register_peer_senders() {
        let (node, _, client) = start("alice");

        assert_eq!(client.send_client_ports(&[9101, 9102]).unwrap(), Message::Success);

        let ports: Vec<u16> = node.get_peer_senders().iter().map(|s| s.get_port()).collect();
        assert_eq!(ports, vec![9101, 9102]);
    }
}
