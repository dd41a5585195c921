use crate::core::monetary::{DEFAULT_DIFFICULTY, MINIMUM_INPUT};
use crate::core::transaction::short;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::Result;
use crate::network::{NodeClient, PeerSenders};
use crate::storage::{TransactionPool, UTXOSet};
use crate::wallet::{ContactMap, Wallet};
use log::{debug, info, warn};
use rand::Rng;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const DEFAULT_CLIENT_ADDRESS: &str = "127.0.0.1";

/// Everything the write lock protects. Mining, block acceptance, chain
/// replacement and pool admission all go through it.
struct NodeState {
    wallet: Wallet,
    chain: Blockchain,
    utxo_set: UTXOSet,
    transaction_pool: TransactionPool,
    contacts: ContactMap,
    self_client_address: String,
}

/// One participant of the ledger network.
///
/// I keep the whole mutable state behind a single `RwLock` so the server
/// threads and the periodic tasks can share one `Arc<PeerNode>`. Every getter
/// hands out a clone; nothing outside this file sees the live state.
pub struct PeerNode {
    owner_name: String,
    difficulty: usize,
    state: RwLock<NodeState>,
    peers: PeerSenders,
}

impl PeerNode {
    pub fn new(owner_name: &str) -> Result<PeerNode> {
        PeerNode::with_difficulty(owner_name, DEFAULT_DIFFICULTY)
    }

    /// Fails only if the keypair cannot be generated
    pub fn with_difficulty(owner_name: &str, difficulty: usize) -> Result<PeerNode> {
        let wallet = Wallet::new()?;
        info!(
            "Node {owner_name} created with address {} (difficulty: {difficulty})",
            short(&wallet.get_address())
        );
        Ok(PeerNode {
            owner_name: owner_name.to_string(),
            difficulty,
            state: RwLock::new(NodeState {
                wallet,
                chain: Blockchain::new(),
                utxo_set: UTXOSet::new(),
                transaction_pool: TransactionPool::new(),
                contacts: ContactMap::new(),
                self_client_address: DEFAULT_CLIENT_ADDRESS.to_string(),
            }),
            peers: PeerSenders::new(),
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state
            .read()
            .expect("Failed to acquire read lock on node state - this should never happen")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state
            .write()
            .expect("Failed to acquire write lock on node state - this should never happen")
    }

    pub fn get_owner_name(&self) -> &str {
        self.owner_name.as_str()
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn get_address(&self) -> String {
        self.read_state().wallet.get_address()
    }

    pub fn get_wallet(&self) -> Wallet {
        self.read_state().wallet.clone()
    }

    pub fn get_block_chain(&self) -> Blockchain {
        self.read_state().chain.clone()
    }

    pub fn chain_len(&self) -> usize {
        self.read_state().chain.len()
    }

    pub fn get_utxo_set(&self) -> UTXOSet {
        self.read_state().utxo_set.clone()
    }

    pub fn get_transaction_pool(&self) -> TransactionPool {
        self.read_state().transaction_pool.clone()
    }

    pub fn get_contacts(&self) -> ContactMap {
        self.read_state().contacts.clone()
    }

    pub fn get_peer_senders(&self) -> Vec<NodeClient> {
        self.peers.get_senders()
    }

    /// Mines a block on top of the current tip with the thread RNG
    pub fn create_block(&self) -> Result<Option<Block>> {
        self.create_block_with_rng(&mut rand::thread_rng())
    }

    /// Builds a block from the pool and mines it.
    ///
    /// The lock is released while mining. Before every attempt the chain
    /// length is compared with the one seen when the block was built; if a
    /// peer block or chain got in first the attempt is abandoned and `None`
    /// comes back. Transactions taken from the pool are not put back.
    pub fn create_block_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<Block>> {
        let (mut block, start_len) = {
            let mut guard = self.write_state();
            let state = &mut *guard;
            let mut block = Block::new(&state.chain.get_tip_hash(), &state.wallet.get_address())?;
            block.collect_from_pool(&mut state.transaction_pool, &state.utxo_set);
            block.set_merkle_root();
            (block, state.chain.len())
        };

        loop {
            if self.chain_len() != start_len {
                info!("Mining was interrupted!");
                return Ok(None);
            }
            if block.one_mining(self.difficulty, rng)? {
                break;
            }
        }

        let mut guard = self.write_state();
        let state = &mut *guard;
        // A peer block may have landed between the last poll and now
        if state.chain.len() != start_len {
            info!("Mining was interrupted!");
            return Ok(None);
        }
        block.process_transactions(&mut state.utxo_set);
        block.update_received_history_of(&mut state.wallet);
        state.chain.add_block(block.clone());
        state.wallet.update_balance(&state.utxo_set);

        info!(
            "{} mined block {} (height = {})",
            self.owner_name,
            short(block.get_hash()),
            state.chain.len()
        );
        Ok(Some(block))
    }

    /// Admits `transaction` into the pool unless it is already pending
    pub fn update_transaction_pool(&self, transaction: Transaction) -> bool {
        self.write_state().transaction_pool.add(transaction)
    }

    /// Appends `block` if it is valid and extends the local tip.
    ///
    /// `false` covers both an invalid block and one that does not build on
    /// this chain; [`PeerNode::verify_new_block_self_hash`] tells them apart.
    /// A double spend inside the block itself is not detected here, see
    /// [`Block::verify_self`].
    pub fn update_block_chain(&self, block: Block) -> bool {
        let mut guard = self.write_state();
        let state = &mut *guard;
        if !state
            .chain
            .verify_new_block(&block, &state.utxo_set, self.difficulty)
        {
            debug!("Block {} rejected", short(block.get_hash()));
            return false;
        }

        let mut block = block;
        block.process_transactions(&mut state.utxo_set);
        block.update_received_history_of(&mut state.wallet);
        state.chain.add_block(block);
        state.wallet.update_balance(&state.utxo_set);
        true
    }

    /// Swaps in `chain` if it is strictly longer and verifies from scratch.
    /// The UTXO set, wallet history and balance are rebuilt from it.
    pub fn replace_block_chain(&self, chain: Blockchain) -> bool {
        let mut guard = self.write_state();
        let state = &mut *guard;
        if chain.len() <= state.chain.len() || !chain.verify_chain(self.difficulty) {
            warn!("New blockchain is not accepted!");
            return false;
        }

        state.utxo_set = chain.generate_utxo_set();
        chain.reset_transaction_history_of(&mut state.wallet);
        state.chain = chain;
        state.wallet.update_balance(&state.utxo_set);
        info!(
            "{} switched to a chain of height {}",
            self.owner_name,
            state.chain.len()
        );
        true
    }

    /// Hash and proof-of-work only
    pub fn verify_new_block_self_hash(&self, block: &Block) -> bool {
        block.verify_self_hash(self.difficulty)
    }

    pub fn start_auto_transaction(&self) -> Option<Transaction> {
        self.start_auto_transaction_with_rng(&mut rand::thread_rng())
    }

    /// Sends a random share of the balance to a random contact (or to
    /// myself when I know nobody) and adds it to the pool.
    ///
    /// Rejected attempts are retried with fresh random values for as long
    /// as the balance stays at or above the minimum input.
    pub fn start_auto_transaction_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<Transaction> {
        let mut guard = self.write_state();
        let state = &mut *guard;

        while state.wallet.get_balance() >= MINIMUM_INPUT {
            let value = rng.gen::<f64>() * state.wallet.get_balance();
            let (recipient_name, recipient_address) = if state.contacts.is_empty() {
                (self.owner_name.clone(), state.wallet.get_address())
            } else {
                let index = rng.gen_range(0..state.contacts.len());
                match state.contacts.nth(index) {
                    Some((name, address)) => (name.to_string(), address.to_string()),
                    None => (self.owner_name.clone(), state.wallet.get_address()),
                }
            };
            let memo = format!(
                "{} send {value:.2} coins to {recipient_name}",
                self.owner_name
            );

            match state
                .wallet
                .send(&recipient_address, value, &memo, &state.utxo_set)
            {
                Ok(transaction) => {
                    state.transaction_pool.add(transaction.clone());
                    return Some(transaction);
                }
                Err(e) => debug!("{e}"),
            }
        }
        None
    }

    pub fn add_contact(&self, name: &str, address: &str) {
        self.write_state().contacts.add(name, address);
    }

    /// Takes the entries of `offered` that are neither me nor already known.
    /// Returns whether every such entry is now in my directory.
    pub fn merge_contacts(&self, offered: &ContactMap) -> bool {
        let mut offered = offered.clone();
        offered.remove(&self.owner_name);

        let mut state = self.write_state();
        let known: Vec<String> = state.contacts.iter().map(|(name, _)| name.to_string()).collect();
        for name in &known {
            offered.remove(name);
        }
        let added = state.contacts.merge(&offered);
        debug!("{} learned {added} new contacts", self.owner_name);
        state.contacts.contains_all(&offered)
    }

    pub fn set_self_client_address(&self, address: &str) {
        self.write_state().self_client_address = address.to_string();
    }

    pub fn get_self_client_address(&self) -> String {
        self.read_state().self_client_address.clone()
    }

    pub fn add_peer_sender(&self, address: &str, port: u16) -> bool {
        self.peers.add_sender(address, port)
    }

    /// Peer sender on my own client address
    pub fn add_peer_sender_port(&self, port: u16) -> bool {
        let address = self.get_self_client_address();
        self.peers.add_sender(&address, port)
    }
}
