//! Application layer for the hosted page.
//!
//! # Sub-modules
//!
//! - **`hosted_bridge`** – The inner side of the WebView bridge.  Posts
//!   messages through the native bridging primitive and routes window
//!   `message` events to registered handlers.
//!
//! - **`manage_products`** – The `ProductRepository` port and the product
//!   service that validates input before it reaches the store.
//!
//! - **`record_scan`** – Scan-to-stock: an `RFID_RESULT` either restocks the
//!   matching product or yields the unknown tag for the new-product form.
//!
//! - **`scanner_panel`** – The scanner panel's view state, kept in sync
//!   with the shell through the bridge.

pub mod hosted_bridge;
pub mod manage_products;
pub mod record_scan;
pub mod scanner_panel;

pub use hosted_bridge::{
    EventData, EventListener, HostedBridge, ListenerId, MessageEvent, MessageEventSource,
    NativePoster, TransportError,
};
pub use manage_products::{ProductRepository, ProductService, ServiceError, StoreError};
pub use record_scan::{RecordScanUseCase, ScanOutcome};
pub use scanner_panel::{PanelState, ScannerPanel};
