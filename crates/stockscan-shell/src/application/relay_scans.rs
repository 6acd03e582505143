//! ScanRelay: connects the RFID reader hardware to the host bridge.
//!
//! # Flow
//!
//! ```text
//! page ── SCAN_RFID ──► HostBridge ─► ScanRelay::handle_scan_request ─► reader.start_scan()
//!                                                                          │
//! page ◄─ SCANNER_STATUS {available, scanning} ◄───────────────────────────┘
//!
//! reader tag ─► ScanRelay::relay_tag ─► HostBridge ── RFID_RESULT ──► page
//! ```
//!
//! The relay keeps the last [`ScannerStatus`] it published.  Every change is
//! pushed to the page; a request that changes nothing still re-publishes the
//! current status so the page can resynchronise its panel.
//!
//! Failures are reported to the page as `RFID_ERROR`:
//!
//! | Situation                        | `code`          |
//! |----------------------------------|-----------------|
//! | no reader hardware               | `SCANNER_ERROR` |
//! | reader refused to start or stop  | `SCAN_FAILED`   |
//! | reader reported a fault mid-scan | `SCANNER_ERROR` |

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use stockscan_core::protocol::{MessageType, RfidErrorPayload, RfidScanResult, ScannerStatus};

use crate::application::host_bridge::HostBridge;

/// Errors reported by reader hardware.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no RFID reader is connected")]
    Unavailable,

    #[error("reader hardware error: {0}")]
    Hardware(String),
}

/// Control surface of an RFID reader.
///
/// Tags are not returned from here: the reader's driver pushes them into
/// [`ScanRelay::relay_tag`] as they are read.
#[cfg_attr(test, mockall::automock)]
pub trait RfidReader: Send + Sync {
    /// Returns `true` if reader hardware is present.
    fn is_available(&self) -> bool;

    fn start_scan(&self) -> Result<(), ScanError>;

    fn stop_scan(&self) -> Result<(), ScanError>;
}

/// Drives an [`RfidReader`] on behalf of the page.
pub struct ScanRelay {
    bridge: Arc<HostBridge>,
    reader: Arc<dyn RfidReader>,
    state: Mutex<ScannerStatus>,
}

impl ScanRelay {
    pub fn new(bridge: Arc<HostBridge>, reader: Arc<dyn RfidReader>) -> Arc<Self> {
        let available = reader.is_available();
        Arc::new(Self {
            bridge,
            reader,
            state: Mutex::new(ScannerStatus {
                available,
                scanning: false,
                error: None,
            }),
        })
    }

    /// Registers the `SCAN_RFID` / `STOP_SCAN` handlers and publishes the
    /// initial status.
    ///
    /// The handlers hold only a weak reference, so dropping the last `Arc`
    /// to the relay turns them into no-ops.
    pub fn attach(self: &Arc<Self>) {
        let relay = Arc::downgrade(self);
        self.bridge.on_scan_request(move || {
            if let Some(relay) = Weak::upgrade(&relay) {
                relay.handle_scan_request();
            }
        });
        let relay = Arc::downgrade(self);
        self.bridge.on_stop_scan_request(move || {
            if let Some(relay) = Weak::upgrade(&relay) {
                relay.handle_stop_request();
            }
        });
        info!("scan relay attached");
        self.publish_status();
    }

    /// Removes the relay's handlers from the bridge.
    pub fn detach(&self) {
        self.bridge.unregister_handler(MessageType::ScanRfid);
        self.bridge.unregister_handler(MessageType::StopScan);
    }

    /// Returns the last published status.
    pub fn status(&self) -> ScannerStatus {
        self.state.lock().clone()
    }

    /// Starts the reader, or explains to the page why it cannot.
    pub fn handle_scan_request(&self) {
        if !self.reader.is_available() {
            warn!("scan requested but no reader is available");
            self.update(|s| {
                s.available = false;
                s.scanning = false;
            });
            let _ = self
                .bridge
                .send_rfid_error(&RfidErrorPayload::scanner_not_available());
            self.publish_status();
            return;
        }

        // Checked and started under one lock so concurrent requests start
        // the reader once.
        let started = {
            let mut state = self.state.lock();
            if state.scanning {
                None
            } else {
                let result = self.reader.start_scan();
                if result.is_ok() {
                    state.available = true;
                    state.scanning = true;
                    state.error = None;
                }
                Some(result)
            }
        };

        match started {
            None => debug!("scan already in progress"),
            Some(Ok(())) => info!("RFID scan started"),
            Some(Err(e)) => self.fail(e, RfidErrorPayload::SCAN_FAILED),
        }
        self.publish_status();
    }

    /// Stops the reader if it is scanning.
    pub fn handle_stop_request(&self) {
        let stopped = {
            let mut state = self.state.lock();
            if state.scanning {
                let result = self.reader.stop_scan();
                if result.is_ok() {
                    state.scanning = false;
                }
                Some(result)
            } else {
                None
            }
        };

        match stopped {
            None => debug!("stop requested while idle"),
            Some(Ok(())) => info!("RFID scan stopped"),
            Some(Err(e)) => self.fail(e, RfidErrorPayload::SCAN_FAILED),
        }
        self.publish_status();
    }

    /// Forwards a tag read by the hardware to the page.
    ///
    /// Reads arriving while no scan is active are dropped.  Returns whether
    /// the tag was sent.
    pub fn relay_tag(&self, result: RfidScanResult) -> bool {
        if !self.state.lock().scanning {
            debug!("dropping tag {} read outside a scan", result.epc);
            return false;
        }
        self.bridge.send_rfid_result(&result).is_ok()
    }

    /// Reports an asynchronous hardware fault.  The scan is considered over.
    pub fn report_hardware_error(&self, message: &str) {
        self.fail(
            ScanError::Hardware(message.to_string()),
            RfidErrorPayload::SCANNER_ERROR,
        );
        self.publish_status();
    }

    fn fail(&self, error: ScanError, code: &str) {
        warn!("scanner failure: {error}");
        let description = error.to_string();
        self.update(|s| {
            s.scanning = false;
            s.error = Some(description.clone());
        });
        let _ = self
            .bridge
            .send_rfid_error(&RfidErrorPayload::new(description, Some(code)));
    }

    fn update(&self, change: impl FnOnce(&mut ScannerStatus)) {
        change(&mut self.state.lock());
    }

    // Snapshot first; the lock must not be held while a handler could re-enter.
    fn publish_status(&self) {
        let status = self.status();
        let _ = self.bridge.send_scanner_status(&status);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host_bridge::ScriptSurface;
    use crate::infrastructure::surface::mock::RecordingSurface;

    fn relay_with(reader: MockRfidReader) -> (Arc<ScanRelay>, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::new());
        let handle: Arc<dyn ScriptSurface> = surface.clone();
        let bridge = Arc::new(HostBridge::new());
        bridge.set_surface(&handle);
        let relay = ScanRelay::new(bridge, Arc::new(reader));
        (relay, surface)
    }

    fn sent_types(surface: &RecordingSurface) -> Vec<MessageType> {
        surface
            .delivered_messages()
            .iter()
            .map(|m| m.message_type)
            .collect()
    }

    #[test]
    fn test_attach_publishes_initial_status() {
        // Arrange
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        let (relay, surface) = relay_with(reader);

        // Act
        relay.attach();

        // Assert
        let sent = surface.delivered_messages();
        assert_eq!(sent.len(), 1);
        let status: ScannerStatus = sent[0].payload_as().unwrap();
        assert!(status.available);
        assert!(!status.scanning);
    }

    #[test]
    fn test_scan_request_without_reader_sends_scanner_error() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(false);
        reader.expect_start_scan().never();
        let (relay, surface) = relay_with(reader);

        relay.handle_scan_request();

        let sent = surface.delivered_messages();
        assert_eq!(sent[0].message_type, MessageType::RfidError);
        assert_eq!(
            sent[0].payload_as::<RfidErrorPayload>().unwrap(),
            RfidErrorPayload::scanner_not_available()
        );
        assert_eq!(sent[1].message_type, MessageType::ScannerStatus);
    }

    #[test]
    fn test_scan_request_starts_reader_and_reports_scanning() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().times(1).returning(|| Ok(()));
        let (relay, surface) = relay_with(reader);

        relay.handle_scan_request();

        assert!(relay.status().scanning);
        let last = surface.delivered_messages().pop().unwrap();
        assert!(last.payload_as::<ScannerStatus>().unwrap().scanning);
    }

    #[test]
    fn test_repeated_scan_request_does_not_restart_reader() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().times(1).returning(|| Ok(()));
        let (relay, surface) = relay_with(reader);

        relay.handle_scan_request();
        relay.handle_scan_request();

        assert_eq!(
            sent_types(&surface),
            vec![MessageType::ScannerStatus, MessageType::ScannerStatus]
        );
    }

    #[test]
    fn test_start_failure_sends_scan_failed() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader
            .expect_start_scan()
            .returning(|| Err(ScanError::Hardware("antenna fault".to_string())));
        let (relay, surface) = relay_with(reader);

        relay.handle_scan_request();

        let sent = surface.delivered_messages();
        let error: RfidErrorPayload = sent[0].payload_as().unwrap();
        assert_eq!(error.code.as_deref(), Some("SCAN_FAILED"));
        assert!(error.message.contains("antenna fault"));
        assert!(!relay.status().scanning);
        assert!(relay.status().error.is_some());
    }

    #[test]
    fn test_stop_request_while_idle_does_not_touch_reader() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_stop_scan().never();
        let (relay, surface) = relay_with(reader);

        relay.handle_stop_request();

        assert_eq!(sent_types(&surface), vec![MessageType::ScannerStatus]);
    }

    #[test]
    fn test_stop_request_stops_active_scan() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().returning(|| Ok(()));
        reader.expect_stop_scan().times(1).returning(|| Ok(()));
        let (relay, _surface) = relay_with(reader);

        relay.handle_scan_request();
        relay.handle_stop_request();

        assert!(!relay.status().scanning);
    }

    #[test]
    fn test_tags_are_relayed_only_while_scanning() {
        // Arrange
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().returning(|| Ok(()));
        let (relay, surface) = relay_with(reader);

        // Act
        let before = relay.relay_tag(RfidScanResult::captured_now("EARLY"));
        relay.handle_scan_request();
        let during = relay.relay_tag(RfidScanResult::captured_now("E200"));

        // Assert
        assert!(!before);
        assert!(during);
        let results: Vec<RfidScanResult> = surface
            .delivered_messages()
            .iter()
            .filter_map(|m| m.payload_as().ok())
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].epc, "E200");
    }

    #[test]
    fn test_hardware_error_ends_scan_and_reports_scanner_error() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().returning(|| Ok(()));
        let (relay, surface) = relay_with(reader);
        relay.handle_scan_request();

        relay.report_hardware_error("reader disconnected");

        let status = relay.status();
        assert!(!status.scanning);
        assert!(status.error.unwrap().contains("reader disconnected"));
        let errors: Vec<RfidErrorPayload> = surface
            .delivered_messages()
            .iter()
            .filter_map(|m| m.payload_as().ok())
            .collect();
        assert_eq!(errors[0].code.as_deref(), Some("SCANNER_ERROR"));
    }

    #[test]
    fn test_detach_removes_request_handlers() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        let (relay, _surface) = relay_with(reader);
        relay.attach();

        relay.detach();

        assert_eq!(relay.bridge.handler_count(), 0);
    }

    #[test]
    fn test_concurrent_scan_requests_start_reader_once() {
        // Arrange
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().times(1).returning(|| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(())
        });
        let (relay, _surface) = relay_with(reader);

        // Act
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| relay.handle_scan_request());
            }
        });

        // Assert
        assert!(relay.status().scanning);
    }

    #[test]
    fn test_concurrent_stop_requests_stop_reader_once() {
        let mut reader = MockRfidReader::new();
        reader.expect_is_available().return_const(true);
        reader.expect_start_scan().returning(|| Ok(()));
        reader.expect_stop_scan().times(1).returning(|| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(())
        });
        let (relay, _surface) = relay_with(reader);
        relay.handle_scan_request();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| relay.handle_stop_request());
            }
        });

        assert!(!relay.status().scanning);
    }
}
