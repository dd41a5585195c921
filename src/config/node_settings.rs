//! Optional TOML settings file for a node or a bootstrap host

use crate::core::monetary::DEFAULT_DIFFICULTY;
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct NodeSettings {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
    #[serde(default)]
    pub bootstrap: Vec<BootstrapEntry>,
}

#[derive(Debug, Deserialize)]
pub struct NodeSection {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_client_address")]
    pub client_address: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen: default_listen(),
            client_address: default_client_address(),
            difficulty: default_difficulty(),
        }
    }
}

/// Initial delay and period of one recurring task, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Period {
    pub delay_ms: u64,
    pub period_ms: u64,
}

impl Period {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_create_block")]
    pub create_block: Period,
    #[serde(default = "default_start_transaction")]
    pub start_transaction: Period,
    #[serde(default = "default_show_blockchain")]
    pub show_blockchain: Period,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            create_block: default_create_block(),
            start_transaction: default_start_transaction(),
            show_blockchain: default_show_blockchain(),
        }
    }
}

/// A peer listener this node broadcasts to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerEntry {
    #[serde(default = "default_client_address")]
    pub address: String,
    pub port: u16,
}

/// A node the bootstrap host wires up: where its listener is, which peer
/// listeners it should open and which peer ports it should send to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BootstrapEntry {
    #[serde(default = "default_client_address")]
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub server_ports: Vec<u16>,
    #[serde(default)]
    pub client_ports: Vec<u16>,
}

impl NodeSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<NodeSettings> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        NodeSettings::parse(&content)
    }

    pub fn parse(content: &str) -> Result<NodeSettings> {
        let settings: NodeSettings = toml::from_str(content)?;

        if settings.node.name.is_empty() {
            return Err(BlockchainError::Config(
                "node.name must not be empty".to_string(),
            ));
        }
        Ok(settings)
    }
}

fn default_name() -> String {
    "node".to_string()
}

fn default_listen() -> String {
    "127.0.0.1:7777".to_string()
}

fn default_client_address() -> String {
    "127.0.0.1".to_string()
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_create_block() -> Period {
    Period {
        delay_ms: 6000,
        period_ms: 20000,
    }
}

fn default_start_transaction() -> Period {
    Period {
        delay_ms: 10000,
        period_ms: 16000,
    }
}

fn default_show_blockchain() -> Period {
    Period {
        delay_ms: 7000,
        period_ms: 4500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = NodeSettings::parse("").unwrap();

        assert_eq!(settings.node.name, "node");
        assert_eq!(settings.node.listen, "127.0.0.1:7777");
        assert_eq!(settings.node.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(settings.schedule, ScheduleSettings::default());
        assert_eq!(settings.schedule.show_blockchain.period(), Duration::from_millis(4500));
        assert!(settings.peers.is_empty());
        assert!(settings.bootstrap.is_empty());
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[node]
name = "alice"
listen = "127.0.0.1:7001"
difficulty = 2

[schedule]
create_block = {{ delay_ms = 100, period_ms = 1000 }}

[[peers]]
port = 8002

[[peers]]
address = "10.0.0.3"
port = 8003

[[bootstrap]]
port = 7002
server_ports = [8001]
client_ports = [8002, 8003]
"#
        )
        .unwrap();

        let settings = NodeSettings::load(file.path()).unwrap();

        assert_eq!(settings.node.name, "alice");
        assert_eq!(settings.node.client_address, "127.0.0.1");
        assert_eq!(settings.node.difficulty, 2);
        assert_eq!(settings.schedule.create_block.delay_ms, 100);
        assert_eq!(settings.schedule.start_transaction.period_ms, 16000);
        assert_eq!(settings.peers.len(), 2);
        assert_eq!(settings.peers[0].address, "127.0.0.1");
        assert_eq!(settings.peers[1].address, "10.0.0.3");
        assert_eq!(settings.bootstrap[0].client_ports, vec![8002, 8003]);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[node\nname = ").unwrap();

        let result = NodeSettings::load(file.path());
        assert!(matches!(result, Err(BlockchainError::Config(_))));

        let missing = NodeSettings::load("/definitely/not/here.toml");
        assert!(matches!(missing, Err(BlockchainError::Config(_))));

        let empty_name = NodeSettings::parse("[node]\nname = \"\"\n");
        assert!(matches!(empty_name, Err(BlockchainError::Config(_))));
    }
}
