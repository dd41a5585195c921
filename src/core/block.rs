use crate::core::monetary::BLOCK_MAX_CAPACITY;
use crate::core::transaction::short;
use crate::core::{MerkleTree, ProofOfWork, Transaction, TransactionContract};
use crate::error::{BlockchainError, Result};
use crate::storage::{TransactionPool, UTXOSet};
use crate::utils::{current_timestamp, deserialize, serialize};
use crate::wallet::Wallet;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A capacity-bounded batch of transactions with a proof-of-work header.
///
/// Slot 0 always holds the creator's reward. `hash` and `merkle_root` stay
/// empty until the block is mined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    previous_hash: String,
    transactions: Vec<Transaction>,
    timestamp: i64,
    merkle_root: String,
    nonce: u32,
    hash: String,
}

impl Block {
    /// Empty block on top of `previous_hash`, paying the reward to `creator`.
    pub fn new(previous_hash: &str, creator: &str) -> Result<Block> {
        Ok(Block {
            previous_hash: previous_hash.to_string(),
            transactions: vec![Transaction::new_reward(creator)?],
            timestamp: 0,
            merkle_root: String::new(),
            nonce: 0,
            hash: String::new(),
        })
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_merkle_root(&self) -> &str {
        self.merkle_root.as_str()
    }

    pub fn get_nonce(&self) -> u32 {
        self.nonce
    }

    pub fn is_full(&self) -> bool {
        self.transactions.len() >= BLOCK_MAX_CAPACITY
    }

    /// Appends `transaction` if it validates against `utxo_set` and the block has room.
    /// `utxo_set` is not touched.
    pub fn add_transaction(&mut self, transaction: Transaction, utxo_set: &UTXOSet) -> bool {
        if self.is_full() {
            debug!("Block is full, dropping transaction {}", short(transaction.get_id()));
            return false;
        }
        if !transaction.outside_validate(utxo_set) {
            debug!("Transaction {} failed validation", short(transaction.get_id()));
            return false;
        }
        self.transactions.push(transaction);
        true
    }

    /// Pulls pending transactions into this block.
    ///
    /// Works on a copy of the pool and of `utxo_set`. Each pooled transaction is
    /// offered to [`Block::add_transaction`] against the working set and then
    /// applied to it whether or not it was accepted, so a later transaction in the
    /// same pass cannot reuse its inputs. Every transaction looked at leaves the
    /// caller's pool, accepted or not. Stops once the block is full.
    pub fn collect_from_pool(&mut self, pool: &mut TransactionPool, utxo_set: &UTXOSet) {
        let pending = pool.get_all();
        let mut working_utxo = utxo_set.clone();
        let mut processed = Vec::new();

        for transaction in pending {
            let added = self.add_transaction(transaction.clone(), &working_utxo);
            transaction.update_utxo(&mut working_utxo);
            debug!(
                "Collected transaction {} (added: {added})",
                short(transaction.get_id())
            );
            processed.push(transaction);

            if self.is_full() {
                break;
            }
        }

        pool.remove_all(&processed);
    }

    /// Recomputes the merkle root over the current transactions
    pub fn set_merkle_root(&mut self) {
        self.merkle_root = MerkleTree::calculate_merkle_root(&self.transactions);
    }

    fn calculate_hash(&self) -> String {
        ProofOfWork::calculate_hash(
            &self.previous_hash,
            self.timestamp,
            self.nonce,
            &self.merkle_root,
        )
    }

    /// One mining attempt: fresh timestamp, random nonce, recomputed hash.
    /// Returns whether the hash meets `difficulty`.
    pub fn one_mining<R: Rng + ?Sized>(&mut self, difficulty: usize, rng: &mut R) -> Result<bool> {
        self.timestamp = current_timestamp()
            .map_err(|e| BlockchainError::Mining(format!("Failed to stamp block: {e}")))?;
        self.nonce = ProofOfWork::draw_nonce(rng);
        self.hash = self.calculate_hash();

        let found = self.validate_pow(difficulty);
        if found {
            info!("Proof-of-work found for block {} (difficulty: {difficulty})", self.hash);
        }
        Ok(found)
    }

    /// Confirms every transaction and applies it to `utxo_set`
    pub fn process_transactions(&mut self, utxo_set: &mut UTXOSet) {
        for transaction in self.transactions.iter_mut() {
            transaction.confirm();
            transaction.update_utxo(utxo_set);
        }
    }

    /// Adds the transactions sent to `wallet` to its history
    pub fn update_received_history_of(&self, wallet: &mut Wallet) {
        for transaction in &self.transactions {
            wallet.update_received_transactions(transaction);
        }
    }

    /// Adds the transactions sent by or to `wallet` to its history
    pub fn update_history_of(&self, wallet: &mut Wallet) {
        for transaction in &self.transactions {
            wallet.update_sent_and_received_transactions(transaction);
        }
    }

    /// Merkle root and hash both match a fresh computation
    pub fn validate_hash_calculation(&self) -> bool {
        MerkleTree::verify_transactions(&self.transactions, &self.merkle_root)
            && self.hash == self.calculate_hash()
    }

    pub fn validate_pow(&self, difficulty: usize) -> bool {
        ProofOfWork::validate(self, difficulty)
    }

    /// Every transaction validates against `utxo_set` on its own, the hash
    /// recomputes and the proof-of-work holds.
    ///
    /// The set does not roll forward between transactions, so two spends of
    /// the same flow inside this block both pass. Only
    /// [`Blockchain::verify_chain`](crate::core::Blockchain::verify_chain)
    /// catches that.
    pub fn verify_self(&self, utxo_set: &UTXOSet, difficulty: usize) -> bool {
        self.transactions
            .iter()
            .all(|transaction| transaction.outside_validate(utxo_set))
            && self.validate_hash_calculation()
            && self.validate_pow(difficulty)
    }

    /// Hash and proof-of-work only, ignoring linkage and transactions
    pub fn verify_self_hash(&self, difficulty: usize) -> bool {
        self.validate_hash_calculation() && self.validate_pow(difficulty)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {}", self.hash)?;
        writeln!(f, "  previous    : {}", self.previous_hash)?;
        writeln!(f, "  timestamp   : {}", self.timestamp)?;
        writeln!(f, "  nonce       : {}", self.nonce)?;
        writeln!(f, "  merkle root : {}", self.merkle_root)?;
        writeln!(f, "  transactions: {}", self.transactions.len())?;
        for transaction in &self.transactions {
            write!(f, "{transaction}")?;
        }
        Ok(())
    }
}
