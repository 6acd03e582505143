//! Infrastructure layer for the loopback run.
//!
//! - **`transport`** – `LoopbackSurface` and `ChannelPoster`, the channel
//!   stand-ins for the browser surface and the native bridging primitive.
//! - **`runner`** – spawns the shell and page tasks and collects the
//!   [`runner::LoopbackReport`].

pub mod runner;
pub mod transport;

pub use runner::{run_loopback, LoopbackReport};
