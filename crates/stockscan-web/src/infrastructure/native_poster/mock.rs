//! Recording native poster for tests.
//!
//! Keeps every posted string so a test can assert on the exact wire text
//! the shell would have received.  Set `should_fail = true` before wrapping
//! it in an `Arc` to simulate a closed channel.

use parking_lot::Mutex;

use stockscan_core::protocol::{decode_text, Message};

use crate::application::hosted_bridge::{NativePoster, TransportError};

#[derive(Default)]
pub struct RecordingPoster {
    /// Every string passed to `post_message`, in order.
    pub posted: Mutex<Vec<String>>,
    pub should_fail: bool,
}

impl RecordingPoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every posted string that is a valid message.
    pub fn posted_messages(&self) -> Vec<Message> {
        self.posted
            .lock()
            .iter()
            .filter_map(|text| decode_text(text).ok())
            .collect()
    }
}

impl NativePoster for RecordingPoster {
    fn post_message(&self, text: &str) -> Result<(), TransportError> {
        if self.should_fail {
            return Err(TransportError::Closed);
        }
        self.posted.lock().push(text.to_string());
        Ok(())
    }
}
