//! Infrastructure layer for the native shell.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `stockscan_core`, but MUST NOT be imported by the `application` layer
//! (test modules excepted).
//!
//! # Sub-modules
//!
//! - **`surface`** – Browser surface adapters.  The embedding application
//!   supplies the real WebView; a `RecordingSurface` that decodes every
//!   injected script is provided for tests.
//!
//! - **`rfid_reader`** – Reader adapters.  A `SimulatedRfidReader` with a
//!   switchable availability flag is provided for tests and demos.
//!
//! - **`storage`** – Loads and saves the shell's TOML configuration file.

pub mod rfid_reader;
pub mod storage;
pub mod surface;
