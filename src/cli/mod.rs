//! Command-line interface
//!
//! This module contains the CLI commands and argument parsing
//! for the node and bootstrap binaries.

pub mod commands;

pub use commands::{Command, Opt, PeerArg};
