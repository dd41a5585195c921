use crate::core::monetary::DEFAULT_DIFFICULTY;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ADDR: &str = "127.0.0.1:7777";
static DEFAULT_NODE_NAME: &str = "node";

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const NODE_NAME_KEY: &str = "NODE_NAME";
const DIFFICULTY_KEY: &str = "DIFFICULTY";

/// Process-wide node settings, seeded from the environment and overridden by
/// the command line or a settings file.
pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut node_addr = String::from(DEFAULT_NODE_ADDR);
        if let Ok(addr) = env::var(NODE_ADDRESS_KEY) {
            node_addr = addr;
        }

        let mut map = HashMap::new();
        map.insert(String::from(NODE_ADDRESS_KEY), node_addr);

        if let Ok(name) = env::var(NODE_NAME_KEY) {
            map.insert(String::from(NODE_NAME_KEY), name);
        }
        if let Ok(difficulty) = env::var(DIFFICULTY_KEY) {
            map.insert(String::from(DIFFICULTY_KEY), difficulty);
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn get_node_addr(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(NODE_ADDRESS_KEY)
            .cloned()
            .unwrap_or_else(|| DEFAULT_NODE_ADDR.to_string())
    }

    pub fn set_node_addr(&self, addr: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(NODE_ADDRESS_KEY), addr);
    }

    pub fn get_node_name(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(NODE_NAME_KEY)
            .cloned()
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string())
    }

    pub fn set_node_name(&self, name: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(NODE_NAME_KEY), name);
    }

    /// Falls back to the default difficulty when unset or unparsable
    pub fn get_difficulty(&self) -> usize {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(DIFFICULTY_KEY)
            .and_then(|d| d.parse().ok())
            .unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn set_difficulty(&self, difficulty: usize) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(DIFFICULTY_KEY), difficulty.to_string());
    }

    /// Host part of the node address (e.g., "127.0.0.1:7777" -> "127.0.0.1")
    pub fn get_listen_host(&self) -> String {
        let addr = self.get_node_addr();
        match addr.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_override_defaults() {
        let config = Config {
            inner: RwLock::new(HashMap::new()),
        };
        assert_eq!(config.get_node_addr(), DEFAULT_NODE_ADDR);
        assert_eq!(config.get_node_name(), DEFAULT_NODE_NAME);
        assert_eq!(config.get_difficulty(), DEFAULT_DIFFICULTY);

        config.set_node_addr("10.0.0.5:9000".to_string());
        config.set_node_name("alice".to_string());
        config.set_difficulty(2);

        assert_eq!(config.get_node_addr(), "10.0.0.5:9000");
        assert_eq!(config.get_listen_host(), "10.0.0.5");
        assert_eq!(config.get_node_name(), "alice");
        assert_eq!(config.get_difficulty(), 2);
    }

    #[test]
    fn test_bad_difficulty_falls_back() {
        let config = Config {
            inner: RwLock::new(HashMap::new()),
        };
        config
            .inner
            .write()
            .unwrap()
            .insert(DIFFICULTY_KEY.to_string(), "hard".to_string());
        assert_eq!(config.get_difficulty(), DEFAULT_DIFFICULTY);
    }
}
