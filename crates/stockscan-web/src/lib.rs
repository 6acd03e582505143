//! stockscan-web library entry point.
//!
//! The *hosted* side of the bridge: the inventory page running inside the
//! shell's browser surface.  It has no handle on the shell; it can only
//!
//! - post strings through the native bridging primitive, when one exists
//!   ([`application::hosted_bridge::NativePoster`]), and
//! - listen for `message` events on its window
//!   ([`application::hosted_bridge::MessageEventSource`]).
//!
//! On top of the bridge sit the page's own concerns: the scanner panel
//! state, the product store, and the scan-to-stock use case that turns an
//! `RFID_RESULT` into a stock change.

/// Application layer: hosted bridge, scanner panel, product use cases.
pub mod application;

/// Infrastructure layer: window event bus, poster adapters, product store.
pub mod infrastructure;
