use crate::core::monetary::GENESIS_PREVIOUS_HASH;
use crate::core::{Block, TransactionContract};
use crate::error::Result;
use crate::storage::UTXOSet;
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, in-memory chain of mined blocks.
///
/// It only grows by [`Blockchain::add_block`]. A node swaps the whole chain
/// out when a longer valid one arrives; blocks are never edited in place.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    pub fn new() -> Blockchain {
        Blockchain { blocks: vec![] }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Blockchain {
        Blockchain { blocks }
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Blockchain> {
        deserialize::<Blockchain>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn get_last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Hash the next block must point at: the tip's hash, or `"0"` when empty
    pub fn get_tip_hash(&self) -> String {
        self.get_last_block()
            .map(|block| block.get_hash().to_string())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn remove_last_block(&mut self) -> Option<Block> {
        self.blocks.pop()
    }

    pub fn contains(&self, block: &Block) -> bool {
        self.blocks.contains(block)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Whether `block` is valid against `utxo_set` and extends the tip
    pub fn verify_new_block(&self, block: &Block, utxo_set: &UTXOSet, difficulty: usize) -> bool {
        block.verify_self(utxo_set, difficulty) && block.get_previous_hash() == self.get_tip_hash()
    }

    /// Replays the whole chain against a fresh UTXO set.
    ///
    /// Each block must point at its predecessor (the first one at `"0"`),
    /// hash correctly, meet `difficulty`, and carry transactions that validate
    /// in order against the running set. Stops at the first failure.
    pub fn verify_chain(&self, difficulty: usize) -> bool {
        let mut temp_utxo = UTXOSet::new();
        let mut expected_previous = GENESIS_PREVIOUS_HASH;

        for (height, block) in self.blocks.iter().enumerate() {
            if block.get_previous_hash() != expected_previous {
                warn!("Previous hash validation failed at height {height}");
                return false;
            }
            if !block.validate_hash_calculation() {
                warn!("Self hash validation failed at height {height}");
                return false;
            }
            if !block.validate_pow(difficulty) {
                warn!("Proof-of-work validation failed at height {height}");
                return false;
            }
            for transaction in block.get_transactions() {
                if !transaction.outside_validate(&temp_utxo) {
                    warn!("Transaction validation failed at height {height}");
                    return false;
                }
                transaction.update_utxo(&mut temp_utxo);
            }
            expected_previous = block.get_hash();
        }
        true
    }

    /// UTXO set obtained by replaying every transaction from the first block
    pub fn generate_utxo_set(&self) -> UTXOSet {
        let mut utxo_set = UTXOSet::new();
        for block in &self.blocks {
            for transaction in block.get_transactions() {
                transaction.update_utxo(&mut utxo_set);
            }
        }
        utxo_set
    }

    /// Rebuilds `wallet`'s history from the transactions it sent or received
    pub fn reset_transaction_history_of(&self, wallet: &mut Wallet) {
        wallet.reset_transaction_history();
        for block in &self.blocks {
            block.update_history_of(wallet);
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HEIGHT = {}", self.len())?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::BLOCK_REWARD;
    use crate::testnet::{mine, mine_next};

    const DIFFICULTY: usize = 1;

    fn chain_of(length: usize, miner: &str) -> Blockchain {
        let mut chain = Blockchain::new();
        for _ in 0..length {
            let block = mine_next(&chain, miner, DIFFICULTY);
            chain.add_block(block);
        }
        chain
    }

    #[test]
    fn test_empty_chain() {
        let chain = Blockchain::new();
        assert!(chain.is_empty());
        assert!(chain.get_last_block().is_none());
        assert_eq!(chain.get_tip_hash(), GENESIS_PREVIOUS_HASH);
        assert!(chain.verify_chain(DIFFICULTY));
        assert!(chain.generate_utxo_set().is_empty());
    }

    #[test]
    fn test_verify_new_block_checks_link() {
        let chain = chain_of(1, "miner");
        let utxo = chain.generate_utxo_set();

        let good = mine_next(&chain, "miner", DIFFICULTY);
        assert!(chain.verify_new_block(&good, &utxo, DIFFICULTY));

        let mut orphan = Block::new("not-the-tip", "miner").unwrap();
        mine(&mut orphan, DIFFICULTY);
        assert!(orphan.verify_self_hash(DIFFICULTY));
        assert!(!chain.verify_new_block(&orphan, &utxo, DIFFICULTY));
    }

    #[test]
    fn test_verify_chain_accepts_valid_chain() {
        let chain = chain_of(3, "miner");
        assert!(chain.verify_chain(DIFFICULTY));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_verify_chain_rejects_broken_link() {
        let mut chain = chain_of(2, "miner");
        let mut stray = Block::new("0", "miner").unwrap();
        mine(&mut stray, DIFFICULTY);
        chain.add_block(stray);

        assert!(!chain.verify_chain(DIFFICULTY));
    }

    #[test]
    fn test_verify_chain_rejects_higher_difficulty() {
        let chain = chain_of(2, "miner");
        // A chain mined at difficulty 1 is very unlikely to meet difficulty 8
        assert!(!chain.verify_chain(8));
    }

    #[test]
    fn test_verify_chain_rejects_unmined_block() {
        let mut chain = chain_of(1, "miner");
        let mut unmined = Block::new(&chain.get_tip_hash(), "miner").unwrap();
        unmined.set_merkle_root();
        chain.add_block(unmined);

        assert!(!chain.verify_chain(0));
    }

    #[test]
    fn test_generate_utxo_set_replays_rewards() {
        let chain = chain_of(3, "miner");
        let utxo = chain.generate_utxo_set();

        assert_eq!(utxo.len(), 3);
        assert!((utxo.balance_of("miner") - 3.0 * BLOCK_REWARD).abs() < 1e-9);
    }

    #[test]
    fn test_remove_last_block_and_contains() {
        let mut chain = chain_of(2, "miner");
        let last = chain.get_last_block().cloned().unwrap();

        assert!(chain.contains(&last));
        assert_eq!(chain.remove_last_block(), Some(last.clone()));
        assert!(!chain.contains(&last));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_reset_transaction_history_of() {
        let mut wallet = Wallet::new().unwrap();
        let chain = chain_of(2, &wallet.get_address());

        chain.reset_transaction_history_of(&mut wallet);
        assert_eq!(wallet.get_transaction_history().len(), 2);

        // Resetting again rebuilds rather than appends
        chain.reset_transaction_history_of(&mut wallet);
        assert_eq!(wallet.get_transaction_history().len(), 2);
    }

    #[test]
    fn test_serialized_chain_still_verifies() {
        let chain = chain_of(2, "miner");
        let decoded = Blockchain::deserialize(&chain.serialize().unwrap()).unwrap();
        assert_eq!(decoded, chain);
        assert!(decoded.verify_chain(DIFFICULTY));
    }
}
