//! Ledger monetary and consensus constants
//!
//! Amounts are plain coins held as `f64`. Every comparison between sums of
//! amounts goes through [`VALUE_EPSILON`] because the ledger never rounds.

/// Coins minted into slot 0 of every block for its creator
pub const BLOCK_REWARD: f64 = 10.0;

/// A normal transaction must consume at least this much
pub const MINIMUM_INPUT: f64 = 1.0;

/// Smallest amount a transaction may carry; smaller requests are raised to it
pub const MINIMUM_VALUE: f64 = 0.1;

/// Tolerance for "inputs equal outputs"
pub const VALUE_EPSILON: f64 = 1e-3;

/// Maximum number of transactions in a block, reward included
pub const BLOCK_MAX_CAPACITY: usize = 5;

/// Leading zero hex characters a block hash needs by default
pub const DEFAULT_DIFFICULTY: usize = 4;

/// `previous_hash` of the first block in any chain
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Memo carried by every reward transaction
pub const REWARD_MEMO: &str = "Block creation reward";

/// Whether two amounts are equal within [`VALUE_EPSILON`]
pub fn amounts_match(left: f64, right: f64) -> bool {
    (left - right).abs() < VALUE_EPSILON
}
