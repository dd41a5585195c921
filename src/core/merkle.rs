use crate::core::Transaction;
use crate::utils::sha256_hex;

/// Binary hash tree over the ordered transaction ids of a block.
///
/// Each level hashes adjacent pairs of the level below (`sha256(left ++ right)`
/// over the hex strings). An odd element at the end of a level is paired with
/// itself, and a lone leaf is likewise hashed with itself, so the root of a
/// one-transaction block is still a hash of a pair. Reordering the
/// transactions changes the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Build every level of the tree from the leaf ids
    pub fn from_ids(ids: &[String]) -> MerkleTree {
        let mut levels = vec![ids.to_vec()];
        if ids.is_empty() {
            return MerkleTree { levels };
        }

        let mut current = ids.to_vec();
        loop {
            let next: Vec<String> = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    // Duplicate the last id if the level has an odd length
                    let right = pair.get(1).unwrap_or(left);
                    Self::hash_pair(left, right)
                })
                .collect();
            let done = next.len() == 1;
            levels.push(next.clone());
            current = next;
            if done {
                break;
            }
        }

        MerkleTree { levels }
    }

    pub fn from_transactions(transactions: &[Transaction]) -> MerkleTree {
        let ids: Vec<String> = transactions
            .iter()
            .map(|tx| tx.get_id().to_string())
            .collect();
        Self::from_ids(&ids)
    }

    /// Root digest, or an empty string for a tree without leaves
    pub fn root(&self) -> String {
        if self.leaf_count() == 0 {
            return String::new();
        }
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    /// Number of hashing levels above the leaves
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    fn hash_pair(left: &str, right: &str) -> String {
        sha256_hex(&format!("{left}{right}"))
    }

    /// Calculate the root without keeping the intermediate levels around
    pub fn calculate_merkle_root(transactions: &[Transaction]) -> String {
        Self::from_transactions(transactions).root()
    }

    /// Whether `transactions` hash to `expected_root`
    pub fn verify_transactions(transactions: &[Transaction], expected_root: &str) -> bool {
        Self::calculate_merkle_root(transactions) == expected_root
    }
}
