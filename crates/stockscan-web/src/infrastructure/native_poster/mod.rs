//! Adapters for the native bridging primitive.
//!
//! Inside the shell's WebView the primitive is provided by the embedder; the
//! loopback binary supplies a channel-backed poster.

pub mod mock;
