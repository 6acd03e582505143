//! stockscan-shell library entry point.
//!
//! The *shell* is the native application that embeds the inventory web page
//! in a browser surface and owns the RFID reader.  It talks to the page only
//! through the WebView bridge:
//!
//! 1. The page posts `SCAN_RFID` / `STOP_SCAN` requests; the shell receives
//!    them through the surface's native message callback
//!    ([`application::host_bridge::HostBridge::receive`]).
//! 2. The [`application::relay_scans::ScanRelay`] drives the reader and
//!    reports `SCANNER_STATUS` snapshots back to the page.
//! 3. Every tag the reader produces is sent to the page as `RFID_RESULT`;
//!    hardware failures become `RFID_ERROR`.
//!
//! Integration tests in `tests/` use the same module tree.

/// Application layer: the host bridge and the scan relay.
pub mod application;

/// Infrastructure layer: surface and reader adapters, config storage.
pub mod infrastructure;
