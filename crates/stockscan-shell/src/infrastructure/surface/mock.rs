//! Recording browser surface for tests.
//!
//! Real surfaces run the injected script inside a page, which cannot be
//! observed from Rust.  `RecordingSurface` keeps every script it is asked to
//! run, and [`RecordingSurface::delivered_messages`] pulls the bridge message
//! back out of each one, so a test can assert on exactly what the page would
//! have received.
//!
//! # Usage in tests
//!
//! ```ignore
//! let surface = Arc::new(RecordingSurface::new());
//! let handle: Arc<dyn ScriptSurface> = surface.clone();
//! bridge.set_surface(&handle);
//!
//! bridge.send_scanner_status(&status).unwrap();
//!
//! assert_eq!(surface.delivered_messages()[0].message_type, MessageType::ScannerStatus);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` before wrapping the surface in an `Arc` to make
//! every injection fail with [`SurfaceError::Detached`].

use parking_lot::Mutex;

use stockscan_core::protocol::{decode_text, extract_injected_payload, Message};

use crate::application::host_bridge::{ScriptSurface, SurfaceError};

/// A surface that records scripts instead of running them.
#[derive(Default)]
pub struct RecordingSurface {
    /// Every script passed to `inject_javascript`, in order.
    pub scripts: Mutex<Vec<String>>,
    /// When `true`, injection fails and nothing is recorded.
    pub should_fail: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the bridge message carried by each recorded script.
    ///
    /// Scripts that do not carry a valid message are skipped.
    pub fn delivered_messages(&self) -> Vec<Message> {
        self.scripts
            .lock()
            .iter()
            .filter_map(|script| extract_injected_payload(script))
            .filter_map(|json| decode_text(json).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.scripts.lock().clear();
    }
}

impl ScriptSurface for RecordingSurface {
    fn inject_javascript(&self, script: &str) -> Result<(), SurfaceError> {
        if self.should_fail {
            return Err(SurfaceError::Detached);
        }
        self.scripts.lock().push(script.to_string());
        Ok(())
    }
}
