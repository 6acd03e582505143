//! Browser surface adapters.
//!
//! The production surface is the platform WebView owned by the embedding
//! application; it implements
//! [`ScriptSurface`](crate::application::host_bridge::ScriptSurface) directly.

pub mod mock;
