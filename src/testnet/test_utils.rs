//! Test utilities for ledger testing

use crate::core::{Block, Blockchain, Transaction, TransactionContract};
use crate::storage::UTXOSet;
use crate::wallet::Wallet;
use rand::RngCore;

/// Mine `block` to completion at `difficulty`
pub fn mine(block: &mut Block, difficulty: usize) {
    block.set_merkle_root();
    let mut rng = rand::thread_rng();
    while !block.one_mining(difficulty, &mut rng).expect("clock error") {}
}

/// A mined, reward-only block on top of `chain`
pub fn mine_next(chain: &Blockchain, miner: &str, difficulty: usize) -> Block {
    let mut block = Block::new(&chain.get_tip_hash(), miner).expect("reward creation");
    mine(&mut block, difficulty);
    block
}

/// A new wallet owning one reward's worth of coins in `utxo_set`
pub fn funded_wallet(utxo_set: &mut UTXOSet) -> (Wallet, Transaction) {
    let mut wallet = Wallet::new().expect("key generation");
    let reward = Transaction::new_reward(&wallet.get_address()).expect("reward creation");
    reward.update_utxo(utxo_set);
    wallet.update_balance(utxo_set);
    (wallet, reward)
}

/// Random source that runs a callback before its first draw.
///
/// Mining draws one nonce per attempt, so the callback runs after the block
/// was prepared and before the first attempt, exactly where a concurrent peer
/// block would land.
pub struct InterruptingRng<F: FnMut()> {
    interrupt: Option<F>,
    inner: rand::rngs::ThreadRng,
}

impl<F: FnMut()> InterruptingRng<F> {
    pub fn new(interrupt: F) -> Self {
        InterruptingRng {
            interrupt: Some(interrupt),
            inner: rand::thread_rng(),
        }
    }

    fn fire(&mut self) {
        if let Some(mut interrupt) = self.interrupt.take() {
            interrupt();
        }
    }
}

impl<F: FnMut()> RngCore for InterruptingRng<F> {
    fn next_u32(&mut self) -> u32 {
        self.fire();
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.fire();
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fire();
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fire();
        self.inner.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::BLOCK_REWARD;

    #[test]
    fn test_mine_next_extends_chain() {
        let mut chain = Blockchain::new();
        let first = mine_next(&chain, "miner", 1);
        chain.add_block(first);
        let second = mine_next(&chain, "miner", 1);

        assert_eq!(second.get_previous_hash(), chain.get_tip_hash());
        assert!(second.verify_self_hash(1));
    }

    #[test]
    fn test_funded_wallet_has_reward() {
        let mut utxo = UTXOSet::new();
        let (wallet, reward) = funded_wallet(&mut utxo);

        assert_eq!(wallet.get_balance(), BLOCK_REWARD);
        assert!(reward.is_sent_to(&wallet.get_address()));
    }

    #[test]
    fn test_interrupting_rng_fires_once() {
        let mut count = 0;
        {
            let mut rng = InterruptingRng::new(|| count += 1);
            rng.next_u32();
            rng.next_u64();
        }
        assert_eq!(count, 1);
    }
}
