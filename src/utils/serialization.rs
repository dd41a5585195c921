// bincode 2 helpers. Ledger values travel inside JSON packages as these byte
// vectors so floating point amounts survive the wire bit for bit.
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on what a single decode may claim. A length prefix asking
/// for more fails instead of allocating.
pub const DECODE_LIMIT: usize = 16 * 1024 * 1024;

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data using bincode 2.0 with standard configuration, capped at [`DECODE_LIMIT`]
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let config = bincode::config::standard().with_limit::<DECODE_LIMIT>();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}

/// Decodes a payload received from a peer, tagging failures with what was expected.
pub fn decode_payload<T>(bytes: &[u8], kind: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    deserialize(bytes)
        .map_err(|e| BlockchainError::Network(format!("Failed to deserialize {kind}: {e}")))
}
