// This file implements the transaction engine - how value moves between wallets
// Every transaction consumes flows from the UTXO set and creates new flows
// A reward transaction creates coins out of nothing for the block creator

use crate::core::monetary::{
    amounts_match, BLOCK_REWARD, MINIMUM_INPUT, MINIMUM_VALUE, REWARD_MEMO,
};
use crate::error::Result;
use crate::storage::UTXOSet;
use crate::utils::{
    base58_decode, current_timestamp_nanos, deserialize, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, serialize, sha256_hex,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

// I keep log lines readable by only printing the head of long hex strings
pub(crate) fn short(value: &str) -> &str {
    value.get(..8).unwrap_or(value)
}

// This is one output of a transaction - "value coins now belong to owner"
// Its id is derived from its content, so it can never be forged into a different amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TransactionFlow {
    id: String,
    owner: String,          // Address that can spend this flow
    value: f64,             // How many coins it carries
    transaction_id: String, // The transaction that created it
}

impl TransactionFlow {
    pub fn new(owner: &str, value: f64, transaction_id: &str) -> TransactionFlow {
        let id = sha256_hex(&format!("{owner}{value}{transaction_id}"));
        TransactionFlow {
            id,
            owner: owner.to_string(),
            value,
            transaction_id: transaction_id.to_string(),
        }
    }

    pub fn get_id(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_owner(&self) -> &str {
        self.owner.as_str()
    }

    pub fn get_value(&self) -> f64 {
        self.value
    }

    pub fn get_transaction_id(&self) -> &str {
        self.transaction_id.as_str()
    }

    pub fn is_owned_by(&self, address: &str) -> bool {
        self.owner == address
    }
}

impl fmt::Display for TransactionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flow {} -> {} : {:.2} (from tx {})",
            short(&self.id),
            short(&self.owner),
            self.value,
            short(&self.transaction_id)
        )
    }
}

// A transaction starts unconfirmed and is confirmed when its block is accepted
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum TransactionState {
    #[default]
    Unconfirmed,
    Confirmed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Unconfirmed => write!(f, "unconfirmed"),
            TransactionState::Confirmed => write!(f, "confirmed"),
        }
    }
}

// These are the fields both transaction kinds share
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TransactionBody {
    id: String,
    recipient: String,
    value: f64,
    timestamp: i64,
    memo: String,
    outputs: Vec<TransactionFlow>,
    state: TransactionState,
}

impl TransactionBody {
    fn new(sender: Option<&str>, recipient: &str, value: f64, memo: &str) -> Result<Self> {
        // I never reject tiny amounts, I raise them to the minimum instead
        let value = if value < MINIMUM_VALUE {
            warn!("Transaction value {value} is below the minimum, using {MINIMUM_VALUE}");
            MINIMUM_VALUE
        } else {
            value
        };
        let timestamp = current_timestamp_nanos()?;
        let id = sha256_hex(&format!(
            "{}{recipient}{value}{memo}{timestamp}",
            sender.unwrap_or_default()
        ));

        Ok(TransactionBody {
            id,
            recipient: recipient.to_string(),
            value,
            timestamp,
            memo: memo.to_string(),
            outputs: vec![],
            state: TransactionState::Unconfirmed,
        })
    }

    fn output_sum(&self) -> f64 {
        self.outputs.iter().map(TransactionFlow::get_value).sum()
    }

    fn add_outputs_to(&self, utxo_set: &mut UTXOSet) {
        for output in &self.outputs {
            utxo_set.put(output.clone());
        }
    }
}

// Two copies of a transaction are the same transaction whatever their state
impl PartialEq for TransactionBody {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.recipient == other.recipient
            && amounts_match(self.value, other.value)
            && self.timestamp == other.timestamp
            && self.memo == other.memo
            && self.outputs == other.outputs
    }
}

/// The validation and bookkeeping contract every transaction kind honours.
pub trait TransactionContract {
    /// Structural self-check that needs no outside state.
    fn inside_validate(&self) -> bool;

    /// Full check a third party can run against its own UTXO set.
    fn outside_validate(&self, utxo_set: &UTXOSet) -> bool;

    /// Applies this transaction to `utxo_set`. Must run at most once per set.
    fn update_utxo(&self, utxo_set: &mut UTXOSet);
}

// This is the reward for creating a block - it has no sender and no inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct RewardTransaction {
    body: TransactionBody,
}

impl RewardTransaction {
    pub fn new(recipient: &str) -> Result<RewardTransaction> {
        let mut body = TransactionBody::new(None, recipient, BLOCK_REWARD, REWARD_MEMO)?;
        let output = TransactionFlow::new(recipient, body.value, &body.id);
        body.outputs.push(output);
        Ok(RewardTransaction { body })
    }
}

impl TransactionContract for RewardTransaction {
    fn inside_validate(&self) -> bool {
        true
    }

    fn outside_validate(&self, _utxo_set: &UTXOSet) -> bool {
        true
    }

    fn update_utxo(&self, utxo_set: &mut UTXOSet) {
        self.body.add_outputs_to(utxo_set);
    }
}

// This is a transfer between two wallets
// The inputs are the sender's flows being spent, the outputs pay the recipient
// and hand any leftover back to the sender as change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct NormalTransaction {
    body: TransactionBody,
    sender: String,
    inputs: UTXOSet,
    signature: Vec<u8>,
}

impl NormalTransaction {
    pub fn new(
        sender: &str,
        recipient: &str,
        value: f64,
        memo: &str,
        inputs: UTXOSet,
    ) -> Result<NormalTransaction> {
        let mut body = TransactionBody::new(Some(sender), recipient, value, memo)?;
        body.outputs
            .push(TransactionFlow::new(recipient, body.value, &body.id));

        // Whatever the inputs hold beyond the sent value goes back to the sender
        let leftover = inputs.sum() - body.output_sum();
        if leftover > 0.0 {
            body.outputs
                .push(TransactionFlow::new(sender, leftover, &body.id));
        }

        Ok(NormalTransaction {
            body,
            sender: sender.to_string(),
            inputs,
            signature: vec![],
        })
    }

    // The signature covers who, to whom, how much and why - never the inputs or outputs
    pub fn signing_payload(&self) -> String {
        format!(
            "{}{}{}{}",
            self.sender, self.body.recipient, self.body.value, self.body.memo
        )
    }

    pub fn sign(&mut self, pkcs8: &[u8]) -> Result<()> {
        let payload = self.signing_payload();
        self.signature = ecdsa_p256_sha256_sign_digest(pkcs8, payload.as_bytes())?;
        Ok(())
    }

    // The sender address is the encoded public key, so I can check the signature
    // without looking anything up
    pub fn has_valid_signature(&self) -> bool {
        let public_key = match base58_decode(&self.sender) {
            Ok(key) => key,
            Err(e) => {
                debug!("Transaction {} has a malformed sender: {e}", short(&self.body.id));
                return false;
            }
        };
        ecdsa_p256_sha256_sign_verify(
            &public_key,
            &self.signature,
            self.signing_payload().as_bytes(),
        )
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_inputs(&self) -> &UTXOSet {
        &self.inputs
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn input_sum(&self) -> f64 {
        self.inputs.sum()
    }

    pub fn output_sum(&self) -> f64 {
        self.body.output_sum()
    }
}

impl TransactionContract for NormalTransaction {
    fn inside_validate(&self) -> bool {
        let input_sum = self.input_sum();
        input_sum >= MINIMUM_INPUT && amounts_match(self.output_sum(), input_sum)
    }

    fn outside_validate(&self, utxo_set: &UTXOSet) -> bool {
        if !self.inside_validate() {
            debug!("Transaction {} is not balanced", short(&self.body.id));
            return false;
        }
        if !utxo_set.contains_all_keys(&self.inputs) {
            debug!("Transaction {} spends unknown flows", short(&self.body.id));
            return false;
        }
        self.has_valid_signature()
    }

    fn update_utxo(&self, utxo_set: &mut UTXOSet) {
        for key in self.inputs.keys() {
            utxo_set.remove(key);
        }
        self.body.add_outputs_to(utxo_set);
    }
}

/// A ledger transaction: either a block reward or a transfer between wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub enum Transaction {
    Reward(RewardTransaction),
    Normal(NormalTransaction),
}

impl Transaction {
    pub fn new_reward(recipient: &str) -> Result<Transaction> {
        Ok(Transaction::Reward(RewardTransaction::new(recipient)?))
    }

    fn body(&self) -> &TransactionBody {
        match self {
            Transaction::Reward(tx) => &tx.body,
            Transaction::Normal(tx) => &tx.body,
        }
    }

    fn body_mut(&mut self) -> &mut TransactionBody {
        match self {
            Transaction::Reward(tx) => &mut tx.body,
            Transaction::Normal(tx) => &mut tx.body,
        }
    }

    pub fn get_id(&self) -> &str {
        self.body().id.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.body().recipient.as_str()
    }

    pub fn get_value(&self) -> f64 {
        self.body().value
    }

    pub fn get_timestamp(&self) -> i64 {
        self.body().timestamp
    }

    pub fn get_memo(&self) -> &str {
        self.body().memo.as_str()
    }

    pub fn get_outputs(&self) -> &[TransactionFlow] {
        self.body().outputs.as_slice()
    }

    pub fn get_state(&self) -> TransactionState {
        self.body().state
    }

    /// `None` for reward transactions
    pub fn get_sender(&self) -> Option<&str> {
        match self {
            Transaction::Reward(_) => None,
            Transaction::Normal(tx) => Some(tx.get_sender()),
        }
    }

    /// `None` for reward transactions
    pub fn get_inputs(&self) -> Option<&UTXOSet> {
        match self {
            Transaction::Reward(_) => None,
            Transaction::Normal(tx) => Some(tx.get_inputs()),
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Transaction::Reward(_))
    }

    pub fn confirm(&mut self) {
        self.body_mut().state = TransactionState::Confirmed;
    }

    pub fn is_confirmed(&self) -> bool {
        self.get_state() == TransactionState::Confirmed
    }

    pub fn is_sent_to(&self, address: &str) -> bool {
        self.get_recipient() == address
    }

    pub fn is_sent_by(&self, address: &str) -> bool {
        self.get_sender() == Some(address)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}

impl TransactionContract for Transaction {
    fn inside_validate(&self) -> bool {
        match self {
            Transaction::Reward(tx) => tx.inside_validate(),
            Transaction::Normal(tx) => tx.inside_validate(),
        }
    }

    fn outside_validate(&self, utxo_set: &UTXOSet) -> bool {
        match self {
            Transaction::Reward(tx) => tx.outside_validate(utxo_set),
            Transaction::Normal(tx) => tx.outside_validate(utxo_set),
        }
    }

    fn update_utxo(&self, utxo_set: &mut UTXOSet) {
        match self {
            Transaction::Reward(tx) => tx.update_utxo(utxo_set),
            Transaction::Normal(tx) => tx.update_utxo(utxo_set),
        }
    }
}

impl From<RewardTransaction> for Transaction {
    fn from(tx: RewardTransaction) -> Self {
        Transaction::Reward(tx)
    }
}

impl From<NormalTransaction> for Transaction {
    fn from(tx: NormalTransaction) -> Self {
        Transaction::Normal(tx)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body();
        match self {
            Transaction::Reward(_) => writeln!(f, "Reward transaction {}", short(&body.id))?,
            Transaction::Normal(tx) => {
                writeln!(f, "Transaction {}", short(&body.id))?;
                writeln!(f, "  from      : {}", short(&tx.sender))?;
                writeln!(
                    f,
                    "  signature : {}",
                    hex::encode(&tx.signature[..tx.signature.len().min(8)])
                )?;
                writeln!(f, "  inputs    : {:.2} in {} flows", tx.input_sum(), tx.inputs.len())?;
            }
        }
        writeln!(f, "  to        : {}", short(&body.recipient))?;
        writeln!(f, "  value     : {:.2}", body.value)?;
        writeln!(f, "  memo      : {}", body.memo)?;
        writeln!(f, "  state     : {}", body.state)?;
        for output in &body.outputs {
            writeln!(f, "    {output}")?;
        }
        Ok(())
    }
}
