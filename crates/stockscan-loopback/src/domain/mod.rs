//! Domain types for the loopback run.

pub mod config;

pub use config::{parse_seed, LoopbackConfig, SeedParseError};
