use crate::core::Transaction;
use log::debug;

/// Pending transactions waiting to be mined, in arrival order.
///
/// Admission only rejects duplicates. Whether a transaction can actually be
/// spent is decided when a block is built or accepted. The pool lives inside
/// the node state, so it carries no lock of its own.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    inner: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool { inner: vec![] }
    }

    /// Appends `tx` unless an equal transaction is already pending
    pub fn add(&mut self, tx: Transaction) -> bool {
        if self.contains(&tx) {
            debug!("Transaction {} is already pending", tx.get_id());
            return false;
        }
        self.inner.push(tx);
        true
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.inner.contains(tx)
    }

    /// Drops every pending transaction equal to one in `processed`
    pub fn remove_all(&mut self, processed: &[Transaction]) {
        self.inner.retain(|tx| !processed.contains(tx));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.inner.clone()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicates() {
        let mut pool = TransactionPool::new();
        let tx = Transaction::new_reward("miner").unwrap();

        assert!(pool.add(tx.clone()));
        assert!(!pool.add(tx.clone()));
        assert_eq!(pool.len(), 1);

        // A confirmed copy is still the same transaction
        let mut confirmed = tx;
        confirmed.confirm();
        assert!(!pool.add(confirmed));
    }

    #[test]
    fn test_remove_all_keeps_order_of_rest() {
        let mut pool = TransactionPool::new();
        let txs: Vec<Transaction> = (0..4)
            .map(|i| Transaction::new_reward(&format!("miner{i}")).unwrap())
            .collect();
        for tx in &txs {
            pool.add(tx.clone());
        }

        pool.remove_all(&[txs[0].clone(), txs[2].clone()]);

        assert_eq!(pool.get_all(), vec![txs[1].clone(), txs[3].clone()]);
    }

    #[test]
    fn test_clear_and_is_empty() {
        let mut pool = TransactionPool::new();
        assert!(pool.is_empty());
        pool.add(Transaction::new_reward("miner").unwrap());
        assert!(!pool.is_empty());
        pool.clear();
        assert!(pool.is_empty());
    }
}
