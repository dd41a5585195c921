use crate::core::transaction::short;
use crate::core::{NormalTransaction, Transaction, TransactionContract};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::{base58_decode, base58_encode, new_key_pair, public_key_from_pkcs8};
use log::debug;
use std::fmt;

/// Length of an uncompressed P-256 public key
pub const PUBLIC_KEY_LEN: usize = 65;

/// A keypair plus the bookkeeping a node keeps for its owner.
///
/// The address is the base58 encoding of the public key, which lets any peer
/// verify a signature from the sender address alone. `balance` is a cache
/// that the owning node recomputes whenever its UTXO set changes.
#[derive(Clone)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
    transaction_history: Vec<Transaction>,
    balance: f64,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        let public_key = public_key_from_pkcs8(&pkcs8)?;
        Ok(Wallet {
            pkcs8,
            public_key,
            transaction_history: vec![],
            balance: 0.0,
        })
    }

    pub fn get_address(&self) -> String {
        base58_encode(self.public_key.as_slice())
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    pub fn get_balance(&self) -> f64 {
        self.balance
    }

    pub fn get_transaction_history(&self) -> &[Transaction] {
        self.transaction_history.as_slice()
    }

    /// Recomputes the balance from scratch out of `utxo_set`
    pub fn update_balance(&mut self, utxo_set: &UTXOSet) {
        self.balance = utxo_set.balance_of(&self.get_address());
    }

    /// First-fit coin selection: takes owned flows in the set's iteration order
    /// until their sum exceeds `target_value`. May fall short if the wallet does
    /// not own enough.
    pub fn generate_inputs(&self, utxo_set: &UTXOSet, target_value: f64) -> UTXOSet {
        let address = self.get_address();
        let mut inputs = UTXOSet::new();
        let mut inputs_sum = 0.0;

        for flow in utxo_set.owned_by(&address) {
            inputs.put(flow.clone());
            inputs_sum += flow.get_value();
            if inputs_sum > target_value {
                break;
            }
        }
        inputs
    }

    /// Builds, signs and self-checks a transfer to `recipient`.
    ///
    /// On success the transaction is appended to the history. The balance is
    /// left alone; it changes once the transaction lands in the UTXO set.
    pub fn send(
        &mut self,
        recipient: &str,
        value: f64,
        memo: &str,
        utxo_set: &UTXOSet,
    ) -> Result<Transaction> {
        let inputs = self.generate_inputs(utxo_set, value);
        let mut transaction =
            NormalTransaction::new(&self.get_address(), recipient, value, memo, inputs)?;
        transaction.sign(&self.pkcs8)?;

        if !transaction.inside_validate() {
            return Err(BlockchainError::InvalidArgument(format!(
                "Invalid transaction: {value:.2} coins requested, inputs hold {:.2}",
                transaction.input_sum()
            )));
        }

        let transaction = Transaction::from(transaction);
        debug!(
            "Wallet {} created transaction {}",
            short(&self.get_address()),
            short(transaction.get_id())
        );
        self.transaction_history.push(transaction.clone());
        Ok(transaction)
    }

    /// Records `transaction` if this wallet received it
    pub fn update_received_transactions(&mut self, transaction: &Transaction) {
        if transaction.is_sent_to(&self.get_address()) {
            self.transaction_history.push(transaction.clone());
        }
    }

    /// Records `transaction` if this wallet sent or received it
    pub fn update_sent_and_received_transactions(&mut self, transaction: &Transaction) {
        let address = self.get_address();
        if transaction.is_sent_by(&address) || transaction.is_sent_to(&address) {
            self.transaction_history.push(transaction.clone());
        }
    }

    pub fn reset_transaction_history(&mut self) {
        self.transaction_history.clear();
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.get_address())
            .field("balance", &self.balance)
            .field("transactions", &self.transaction_history.len())
            .finish()
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wallet: {}", self.get_address())?;
        writeln!(f, "Current balance: {:.2}", self.balance)?;
        writeln!(f, "Transaction history: {}", self.transaction_history.len())?;
        for transaction in &self.transaction_history {
            write!(f, "{transaction}")?;
        }
        Ok(())
    }
}

/// Whether `address` decodes to an uncompressed P-256 public key
pub fn validate_address(address: &str) -> bool {
    match base58_decode(address) {
        Ok(key) => key.len() == PUBLIC_KEY_LEN && key[0] == 0x04,
        Err(_) => false,
    }
}

/// Public key bytes behind an address
pub fn address_to_public_key(address: &str) -> Result<Vec<u8>> {
    if !validate_address(address) {
        return Err(BlockchainError::InvalidAddress(address.to_string()));
    }
    base58_decode(address)
}
