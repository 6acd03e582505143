//! RFID reader adapters.
//!
//! Vendor reader SDKs are wired in by the embedding application through
//! [`RfidReader`](crate::application::relay_scans::RfidReader).

pub mod mock;
