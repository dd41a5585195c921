use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol tags. A request carries one of the request tags; a status reply
/// carries `Success`, `Fail` or `BlockchainRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Transaction,
    Block,
    Blockchain,
    BlockchainRequest,
    Success,
    Fail,
    ContactRequest,
    ContactMap,
    ServerPort,
    ClientPort,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Message::Transaction => "TRANSACTION",
            Message::Block => "BLOCK",
            Message::Blockchain => "BLOCKCHAIN",
            Message::BlockchainRequest => "BLOCKCHAIN_REQUEST",
            Message::Success => "SUCCESS",
            Message::Fail => "FAIL",
            Message::ContactRequest => "CONTACT_REQUEST",
            Message::ContactMap => "CONTACT_MAP",
            Message::ServerPort => "SERVER_PORT",
            Message::ClientPort => "CLIENT_PORT",
        };
        f.write_str(tag)
    }
}

/// One request per connection. Ledger payloads travel as bincode bytes
/// inside the JSON envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Package {
    Transaction {
        addr_from: String,
        transaction: Vec<u8>,
    },
    Block {
        addr_from: String,
        block: Vec<u8>,
    },
    Blockchain {
        addr_from: String,
        blockchain: Vec<u8>,
    },
    BlockchainRequest {
        addr_from: String,
    },
    ContactRequest {
        addr_from: String,
    },
    ContactMap {
        addr_from: String,
        contacts: Vec<u8>,
    },
    ServerPort {
        addr_from: String,
        ports: Vec<u16>,
    },
    ClientPort {
        addr_from: String,
        ports: Vec<u16>,
    },
}

impl Package {
    pub fn kind(&self) -> Message {
        match self {
            Package::Transaction { .. } => Message::Transaction,
            Package::Block { .. } => Message::Block,
            Package::Blockchain { .. } => Message::Blockchain,
            Package::BlockchainRequest { .. } => Message::BlockchainRequest,
            Package::ContactRequest { .. } => Message::ContactRequest,
            Package::ContactMap { .. } => Message::ContactMap,
            Package::ServerPort { .. } => Message::ServerPort,
            Package::ClientPort { .. } => Message::ClientPort,
        }
    }

    pub fn addr_from(&self) -> &str {
        match self {
            Package::Transaction { addr_from, .. }
            | Package::Block { addr_from, .. }
            | Package::Blockchain { addr_from, .. }
            | Package::BlockchainRequest { addr_from }
            | Package::ContactRequest { addr_from }
            | Package::ContactMap { addr_from, .. }
            | Package::ServerPort { addr_from, .. }
            | Package::ClientPort { addr_from, .. } => addr_from.as_str(),
        }
    }
}

/// What the server writes back before closing the connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    Status(Message),
    Blockchain { blockchain: Vec<u8> },
    Contact { name: String, address: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_serialization() {
        let pkg = Package::ServerPort {
            addr_from: "127.0.0.1:7777".to_string(),
            ports: vec![8001, 8002],
        };

        let serialized = serde_json::to_string(&pkg).unwrap();
        let deserialized: Package = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.kind(), Message::ServerPort);
        assert_eq!(deserialized.addr_from(), "127.0.0.1:7777");
    }

    #[test]
    fn test_status_reply_serialization() {
        let serialized = serde_json::to_string(&Reply::Status(Message::BlockchainRequest)).unwrap();
        assert_eq!(serialized, r#"{"Status":"BlockchainRequest"}"#);

        let reply: Reply = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reply, Reply::Status(Message::BlockchainRequest));
    }

    #[test]
    fn test_message_display_uses_protocol_names() {
        assert_eq!(Message::BlockchainRequest.to_string(), "BLOCKCHAIN_REQUEST");
        assert_eq!(Message::ContactMap.to_string(), "CONTACT_MAP");
    }
}
