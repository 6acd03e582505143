//! Channel-backed stand-ins for the two WebView transport primitives.
//!
//! [`LoopbackSurface`] plays the browser: it "runs" the script the host
//! bridge injects by pulling the message literal back out and posting it to
//! the page task as an already-parsed value, the way a browser hands a
//! `message` event to its listeners.
//!
//! [`ChannelPoster`] plays `window.ReactNativeWebView`: the page's string
//! goes to the shell task untouched.

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use stockscan_core::protocol::extract_injected_payload;
use stockscan_shell::application::{ScriptSurface, SurfaceError};
use stockscan_web::application::{NativePoster, TransportError};

pub struct LoopbackSurface {
    to_page: UnboundedSender<Value>,
}

impl LoopbackSurface {
    pub fn new(to_page: UnboundedSender<Value>) -> Self {
        Self { to_page }
    }
}

impl ScriptSurface for LoopbackSurface {
    fn inject_javascript(&self, script: &str) -> Result<(), SurfaceError> {
        let literal = extract_injected_payload(script).ok_or_else(|| {
            SurfaceError::Execution("script does not post a bridge message".to_string())
        })?;
        let value: Value = serde_json::from_str(literal)
            .map_err(|e| SurfaceError::Execution(format!("unparseable message literal: {e}")))?;
        trace!("surface delivering {literal}");
        self.to_page.send(value).map_err(|_| SurfaceError::Detached)
    }
}

pub struct ChannelPoster {
    to_shell: UnboundedSender<String>,
}

impl ChannelPoster {
    pub fn new(to_shell: UnboundedSender<String>) -> Self {
        Self { to_shell }
    }
}

impl NativePoster for ChannelPoster {
    fn post_message(&self, text: &str) -> Result<(), TransportError> {
        self.to_shell
            .send(text.to_string())
            .map_err(|_| TransportError::Closed)
    }
}
