//! Test fixtures for ledger and node tests
//!
//! Mining helpers at low difficulty, funded wallets, and a random source that
//! can simulate a peer block arriving in the middle of a mining loop.

pub mod test_utils;

pub use test_utils::*;
