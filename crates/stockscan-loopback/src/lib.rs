//! stockscan-loopback library crate.
//!
//! Runs a complete shell (host bridge, scan relay, simulated reader) and a
//! complete page (hosted bridge, scanner panel, product store) in one
//! process.  Each peer gets its own tokio task; the WebView transport is
//! replaced by two unbounded channels:
//!
//! ```text
//! shell task                                   page task
//! HostBridge ── inject_javascript ─► LoopbackSurface ══ Value ══►  WindowEventBus ─► HostedBridge
//! HostBridge ◄─ receive ◄══ String ══ ChannelPoster ◄─ post_message ─ HostedBridge
//! ```
//!
//! # Layers
//!
//! - `domain` – [`domain::LoopbackConfig`] and the seed-product syntax.
//! - `infrastructure` – the channel transports and the two peer tasks.

/// Domain layer: run configuration.
pub mod domain;

/// Infrastructure layer: channel transports and the loopback runner.
pub mod infrastructure;
