//! Wallets and the contact directory
//!
//! Key management, coin selection, signing, and the name -> address map
//! nodes exchange while bootstrapping.

pub mod contacts;
#[allow(clippy::module_inception)]
pub mod wallet;

pub use contacts::ContactMap;
pub use wallet::{address_to_public_key, validate_address, Wallet, PUBLIC_KEY_LEN};
