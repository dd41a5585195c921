//! Utility functions and helpers
//!
//! Hashing, key handling, encodings and the bincode helpers shared by
//! every ledger type.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, current_timestamp_nanos,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    public_key_from_pkcs8, sha256_digest, sha256_hex,
};

pub use serialization::{deserialize, serialize};
