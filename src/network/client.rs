use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::message::{Message, Package, Reply};
use crate::utils::serialization::decode_payload;
use crate::wallet::ContactMap;
use log::debug;
use serde_json::Deserializer;
use std::fmt;
use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const TCP_WRITE_TIMEOUT: u64 = 5000;
const TCP_READ_TIMEOUT: u64 = 30000;

/// Sending half of a link to one peer listener.
///
/// Every call opens a fresh connection, writes one package, reads one reply
/// and closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeClient {
    address: String,
    port: u16,
}

impl NodeClient {
    pub fn new(address: &str, port: u16) -> NodeClient {
        NodeClient {
            address: address.to_string(),
            port,
        }
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// `address:port` of the remote listener
    pub fn get_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn send_transaction(&self, transaction: &Transaction) -> Result<Message> {
        let pkg = Package::Transaction {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            transaction: transaction.serialize()?,
        };
        expect_status(self.request(pkg)?)
    }

    /// `BlockchainRequest` in the answer means the block was well formed but
    /// did not extend the peer's tip.
    pub fn send_block(&self, block: &Block) -> Result<Message> {
        let pkg = Package::Block {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            block: block.serialize()?,
        };
        expect_status(self.request(pkg)?)
    }

    pub fn send_blockchain(&self, blockchain: &Blockchain) -> Result<Message> {
        let pkg = Package::Blockchain {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            blockchain: blockchain.serialize()?,
        };
        expect_status(self.request(pkg)?)
    }

    pub fn send_blockchain_request(&self) -> Result<Blockchain> {
        let pkg = Package::BlockchainRequest {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
        };
        match self.request(pkg)? {
            Reply::Blockchain { blockchain } => decode_payload(&blockchain, "blockchain"),
            other => Err(unexpected(&other)),
        }
    }

    /// Asks the peer for its `(name, address)` pair
    pub fn send_contact_request(&self) -> Result<(String, String)> {
        let pkg = Package::ContactRequest {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
        };
        match self.request(pkg)? {
            Reply::Contact { name, address } => {
                debug!("Received new contact: {name}, {address}");
                Ok((name, address))
            }
            other => Err(unexpected(&other)),
        }
    }

    pub fn send_contact_map(&self, contacts: &ContactMap) -> Result<Message> {
        let pkg = Package::ContactMap {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            contacts: crate::utils::serialize(contacts)?,
        };
        expect_status(self.request(pkg)?)
    }

    pub fn send_server_ports(&self, ports: &[u16]) -> Result<Message> {
        let pkg = Package::ServerPort {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            ports: ports.to_vec(),
        };
        expect_status(self.request(pkg)?)
    }

    pub fn send_client_ports(&self, ports: &[u16]) -> Result<Message> {
        let pkg = Package::ClientPort {
            addr_from: GLOBAL_CONFIG.get_node_addr(),
            ports: ports.to_vec(),
        };
        expect_status(self.request(pkg)?)
    }

    fn resolve(&self) -> Result<SocketAddr> {
        (self.address.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| BlockchainError::Network(format!("Invalid address {self}: {e}")))?
            .next()
            .ok_or_else(|| BlockchainError::Network(format!("No address found for {self}")))
    }

    fn request(&self, pkg: Package) -> Result<Reply> {
        let addr = self.resolve()?;
        debug!("Sending {} to {addr}", pkg.kind());

        let stream = TcpStream::connect_timeout(&addr, Duration::from_millis(TCP_WRITE_TIMEOUT))
            .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;
        stream
            .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
        stream
            .set_read_timeout(Some(Duration::from_millis(TCP_READ_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        serde_json::to_writer(&stream, &pkg)
            .map_err(|e| BlockchainError::Network(format!("Failed to send data: {e}")))?;
        let _ = stream.shutdown(Shutdown::Write);

        let reader = BufReader::new(&stream);
        let reply = Deserializer::from_reader(reader)
            .into_iter::<Reply>()
            .next()
            .ok_or_else(|| BlockchainError::Network(format!("{addr} closed without reply")))?
            .map_err(|e| BlockchainError::Network(format!("Failed to deserialize reply: {e}")))?;

        let _ = stream.shutdown(Shutdown::Both);
        Ok(reply)
    }
}

impl fmt::Display for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.address, self.port)
    }
}

fn expect_status(reply: Reply) -> Result<Message> {
    match reply {
        Reply::Status(message) => Ok(message),
        other => Err(unexpected(&other)),
    }
}

fn unexpected(reply: &Reply) -> BlockchainError {
    let kind = match reply {
        Reply::Status(message) => message.to_string(),
        Reply::Blockchain { .. } => "BLOCKCHAIN".to_string(),
        Reply::Contact { .. } => "CONTACT".to_string(),
    };
    BlockchainError::Network(format!("Unexpected reply: {kind}"))
}
