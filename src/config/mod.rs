//! Configuration management
//!
//! `GLOBAL_CONFIG` holds the process-wide node address, name and difficulty.
//! `NodeSettings` is the optional TOML file with peers, bootstrap targets and
//! the task schedule.

pub mod node_settings;
pub mod settings;

pub use node_settings::{BootstrapEntry, NodeSettings, PeerEntry, Period, ScheduleSettings};
pub use settings::{Config, GLOBAL_CONFIG};
