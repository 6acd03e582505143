//! Infrastructure layer for the hosted page.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `stockscan_core`, but MUST NOT be imported by the `application` layer
//! (test modules excepted).
//!
//! # Sub-modules
//!
//! - **`event_bus`** – `WindowEventBus`, an in-process stand-in for the
//!   page's window `message` event target.
//!
//! - **`native_poster`** – Adapters for the native bridging primitive.  A
//!   `RecordingPoster` is provided for tests.
//!
//! - **`storage`** – Product store implementations.

pub mod event_bus;
pub mod native_poster;
pub mod storage;
