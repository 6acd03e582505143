//! # stockscan-core
//!
//! Shared library for StockScan containing the WebView message contract, the
//! JSON codec and validation rules, the per-peer handler registry, and the
//! product domain types used by the inventory screens.
//!
//! This crate is used by both the native shell and the hosted web content.
//! It has zero dependencies on browser surfaces, OS APIs, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! The inventory application runs as a web page inside an embedded browser
//! view.  The native shell around it owns the RFID hardware.  The two sides
//! run in isolated execution contexts and can only exchange *strings*:
//!
//! ```text
//! Hosted page (stockscan-web)            Native shell (stockscan-shell)
//! ─────────────────────────────────────────────────────────────────────
//! HostedBridge ── postMessage(json) ──────────►  HostBridge::receive
//! HostedBridge ◄── injectJavaScript(script) ───  HostBridge::send
//! ```
//!
//! Both bridges share everything in this crate:
//!
//! - **`protocol`** – The closed set of message types, the typed payloads,
//!   the validation algorithm, JSON encoding/decoding, the handler registry
//!   that routes a validated message to its single handler, and the optional
//!   direction policy.
//!
//! - **`domain`** – Product records and the product validator used by the
//!   web side when a scan result is turned into a stock change.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `stockscan_core::Message` instead of `stockscan_core::protocol::messages::Message`.
pub use domain::product::{Product, ProductFieldError, ProductInput, ProductValidator};
pub use protocol::codec::{decode_text, encode, validate, BridgeError, ValidationError};
pub use protocol::messages::{
    Message, MessageType, Payload, PayloadError, RfidErrorPayload, RfidScanResult, ScannerStatus,
};
pub use protocol::policy::{Direction, DirectionPolicy, Peer};
pub use protocol::registry::{Dispatch, Handler, HandlerRegistry};
