//! Storage infrastructure: the shell's configuration file.
//!
//! The `config` sub-module reads the TOML file from the platform config
//! directory, writes it back, and supplies defaults on first run.

pub mod config;
