use crate::core::TransactionFlow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unspent output flows, keyed by flow id.
///
/// This is the only place spendable funds are recorded. Iteration order is a
/// `HashMap`'s and carries no meaning. `Clone` is a full snapshot: flows are
/// immutable, so copying the entries is enough.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct UTXOSet {
    inner: HashMap<String, TransactionFlow>,
}

impl UTXOSet {
    pub fn new() -> UTXOSet {
        UTXOSet {
            inner: HashMap::new(),
        }
    }

    /// Inserts a flow under its own id, replacing any entry with that id.
    pub fn put(&mut self, flow: TransactionFlow) {
        self.inner.insert(flow.get_id().to_string(), flow);
    }

    pub fn remove(&mut self, flow_id: &str) -> Option<TransactionFlow> {
        self.inner.remove(flow_id)
    }

    pub fn contains_key(&self, flow_id: &str) -> bool {
        self.inner.contains_key(flow_id)
    }

    pub fn get(&self, flow_id: &str) -> Option<&TransactionFlow> {
        self.inner.get(flow_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }

    pub fn flows(&self) -> impl Iterator<Item = &TransactionFlow> {
        self.inner.values()
    }

    /// Sum of every flow value in the set
    pub fn sum(&self) -> f64 {
        self.inner.values().map(TransactionFlow::get_value).sum()
    }

    pub fn owned_by<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a TransactionFlow> {
        self.inner.values().filter(move |flow| flow.is_owned_by(address))
    }

    /// Sum of the flows locked to `address`
    pub fn balance_of(&self, address: &str) -> f64 {
        self.owned_by(address).map(TransactionFlow::get_value).sum()
    }

    /// Whether every key of `other` is present here
    pub fn contains_all_keys(&self, other: &UTXOSet) -> bool {
        other.keys().all(|key| self.contains_key(key))
    }
}

impl fmt::Display for UTXOSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UTXO set ({} flows, {:.2} coins)", self.len(), self.sum())?;
        for flow in self.flows() {
            writeln!(f, "  {flow}")?;
        }
        Ok(())
    }
}
