use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Directory of known participants, name -> wallet address, ordered by name.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct ContactMap {
    inner: BTreeMap<String, String>,
}

impl ContactMap {
    pub fn new() -> ContactMap {
        ContactMap {
            inner: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, name: &str, address: &str) {
        self.inner.insert(name.to_string(), address.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Contact at position `index` in name order
    pub fn nth(&self, index: usize) -> Option<(&str, &str)> {
        self.iter().nth(index)
    }

    /// Adds every contact of `other` whose name is not known yet.
    /// Returns how many were added.
    pub fn merge(&mut self, other: &ContactMap) -> usize {
        let mut added = 0;
        for (name, address) in other.iter() {
            if !self.contains(name) {
                self.add(name, address);
                added += 1;
            }
        }
        added
    }

    /// Whether every entry of `other` is present here with the same address
    pub fn contains_all(&self, other: &ContactMap) -> bool {
        other
            .iter()
            .all(|(name, address)| self.get(name) == Some(address))
    }
}

impl fmt::Display for ContactMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, address) in self.iter() {
            writeln!(f, "{name}: {address}")?;
        }
        Ok(())
    }
}
