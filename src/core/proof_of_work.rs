use crate::core::Block;
use crate::utils::sha256_hex;
use rand::Rng;

/// Largest nonce a mining attempt draws (exclusive)
const MAX_NONCE: u32 = i32::MAX as u32;

/// Leading-zero proof-of-work over the hex block hash.
///
/// A hash satisfies difficulty `d` when its first `d` characters are all `'0'`.
/// Difficulty 0 is satisfied by any hash.
pub struct ProofOfWork {
    difficulty: usize,
    target: String,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> ProofOfWork {
        ProofOfWork {
            difficulty,
            target: "0".repeat(difficulty),
        }
    }

    pub fn get_difficulty(&self) -> usize {
        self.difficulty
    }

    /// The prefix a satisfying hash starts with
    pub fn get_target(&self) -> &str {
        self.target.as_str()
    }

    /// Block hash: `sha256(previous_hash ++ timestamp ++ nonce ++ merkle_root)` in hex
    pub fn calculate_hash(
        previous_hash: &str,
        timestamp: i64,
        nonce: u32,
        merkle_root: &str,
    ) -> String {
        sha256_hex(&format!("{previous_hash}{timestamp}{nonce}{merkle_root}"))
    }

    pub fn is_satisfied_by(&self, hash: &str) -> bool {
        hash.starts_with(self.target.as_str())
    }

    /// Recheck the leading-zero condition on a block's stored hash
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        ProofOfWork::new(difficulty).is_satisfied_by(block.get_hash())
    }

    /// Draw the nonce for one mining attempt
    pub fn draw_nonce<R: Rng + ?Sized>(rng: &mut R) -> u32 {
        rng.gen_range(0..MAX_NONCE)
    }
}
