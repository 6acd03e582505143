//! Application layer for the native shell.
//!
//! # Sub-modules
//!
//! - **`host_bridge`** – The outer side of the WebView bridge.  Sends
//!   messages into the page by injecting script into the browser surface and
//!   routes messages posted by the page to registered handlers.
//!
//! - **`relay_scans`** – Connects the RFID reader to the bridge: turns scan
//!   requests into reader commands and reader output into bridge messages.
//!
//! Both depend only on traits ([`host_bridge::ScriptSurface`],
//! [`relay_scans::RfidReader`]); concrete adapters live in the
//! infrastructure layer or in the embedding application.

pub mod host_bridge;
pub mod relay_scans;

pub use host_bridge::{HostBridge, NativeMessageEvent, ScriptSurface, SurfaceError};
pub use relay_scans::{RfidReader, ScanError, ScanRelay};
