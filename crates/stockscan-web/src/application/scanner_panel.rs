//! ScannerPanel: the page's view of the shell's RFID scanner.
//!
//! # State transitions
//!
//! | Input                   | Effect                                                   |
//! |-------------------------|----------------------------------------------------------|
//! | `SCANNER_STATUS`        | `available`, `scanning` copied from the payload          |
//! | `RFID_RESULT`           | `last_tag` set, `error` cleared, scan recorded           |
//! | `RFID_ERROR`            | `error` set, `scanning` cleared                          |
//! | [`ScannerPanel::start_scan`] | `SCAN_RFID` sent; `scanning` set, `error` cleared   |
//! | [`ScannerPanel::stop_scan`]  | `STOP_SCAN` sent; `scanning` cleared                |
//!
//! Start and stop update the panel optimistically, before the shell answers
//! with a status.  An unknown tag is parked in `pending_tag` until the
//! new-product form takes it.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use stockscan_core::protocol::{
    BridgeError, MessageType, RfidErrorPayload, RfidScanResult, ScannerStatus,
};

use crate::application::hosted_bridge::HostedBridge;
use crate::application::record_scan::{RecordScanUseCase, ScanOutcome};

/// Shown when an `RFID_ERROR` arrives without a message.
const GENERIC_SCAN_ERROR: &str = "RFID scan failed";

/// Snapshot of the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub available: bool,
    pub scanning: bool,
    pub last_tag: Option<String>,
    pub error: Option<String>,
    /// Unknown tag waiting for the new-product form.
    pub pending_tag: Option<String>,
    pub last_outcome: Option<ScanOutcome>,
}

impl PanelState {
    /// The panel is hidden when the shell has no scanner.
    pub fn is_visible(&self) -> bool {
        self.available
    }
}

pub struct ScannerPanel {
    bridge: Arc<HostedBridge>,
    record_scan: RecordScanUseCase,
    state: Mutex<PanelState>,
}

impl ScannerPanel {
    pub fn new(bridge: Arc<HostedBridge>, record_scan: RecordScanUseCase) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            record_scan,
            state: Mutex::new(PanelState::default()),
        })
    }

    /// Registers the panel's `RFID_RESULT`, `RFID_ERROR` and
    /// `SCANNER_STATUS` handlers on the bridge.
    pub fn attach(self: &Arc<Self>) {
        let panel: Weak<Self> = Arc::downgrade(self);
        self.bridge.on_scanner_status(move |status| {
            if let Some(panel) = panel.upgrade() {
                panel.apply_status(&status);
            }
        });
        let panel: Weak<Self> = Arc::downgrade(self);
        self.bridge.on_rfid_result(move |result| {
            if let Some(panel) = panel.upgrade() {
                panel.apply_result(&result);
            }
        });
        let panel: Weak<Self> = Arc::downgrade(self);
        self.bridge.on_rfid_error(move |err| {
            if let Some(panel) = panel.upgrade() {
                panel.apply_error(&err);
            }
        });
    }

    pub fn detach(&self) {
        for t in [
            MessageType::ScannerStatus,
            MessageType::RfidResult,
            MessageType::RfidError,
        ] {
            self.bridge.unregister_handler(t);
        }
    }

    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    /// Asks the shell to scan.
    ///
    /// # Errors
    ///
    /// Returns the bridge error if the request could not be posted; the
    /// panel state is updated either way.
    pub fn start_scan(&self) -> Result<(), BridgeError> {
        {
            let mut state = self.state.lock();
            state.scanning = true;
            state.error = None;
        }
        self.bridge.start_rfid_scan()
    }

    /// Asks the shell to stop scanning.
    ///
    /// # Errors
    ///
    /// As [`start_scan`](Self::start_scan).
    pub fn stop_scan(&self) -> Result<(), BridgeError> {
        self.state.lock().scanning = false;
        self.bridge.stop_rfid_scan()
    }

    /// Hands the parked unknown tag to the new-product form.
    pub fn take_pending_tag(&self) -> Option<String> {
        self.state.lock().pending_tag.take()
    }

    pub fn apply_status(&self, status: &ScannerStatus) {
        debug!(
            "scanner status: available={} scanning={}",
            status.available, status.scanning
        );
        let mut state = self.state.lock();
        state.available = status.available;
        state.scanning = status.scanning;
    }

    /// Records a tag read and returns what it did to the inventory.
    pub fn apply_result(&self, result: &RfidScanResult) -> Option<ScanOutcome> {
        {
            let mut state = self.state.lock();
            state.last_tag = Some(result.epc.clone());
            state.error = None;
        }

        let outcome = match self.record_scan.record(result) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("failed to record scan of {}: {e}", result.epc);
                self.state.lock().error = Some(e.to_string());
                return None;
            }
        };

        let mut state = self.state.lock();
        if let ScanOutcome::Unknown { rfid_tag } = &outcome {
            state.pending_tag = Some(rfid_tag.clone());
        }
        state.last_outcome = Some(outcome.clone());
        Some(outcome)
    }

    pub fn apply_error(&self, err: &RfidErrorPayload) {
        warn!(
            "RFID error from shell: {} ({})",
            err.message,
            err.code.as_deref().unwrap_or("no code")
        );
        let message = if err.message.is_empty() {
            GENERIC_SCAN_ERROR.to_string()
        } else {
            err.message.clone()
        };
        let mut state = self.state.lock();
        state.error = Some(message);
        state.scanning = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hosted_bridge::{MessageEvent, MockNativePoster, NativePoster};
    use crate::application::manage_products::ProductRepository;
    use crate::infrastructure::event_bus::WindowEventBus;
    use crate::infrastructure::storage::memory::InMemoryProductStore;
    use stockscan_core::domain::product::ProductInput;

    struct Fixture {
        panel: Arc<ScannerPanel>,
        bus: Arc<WindowEventBus>,
        store: Arc<InMemoryProductStore>,
    }

    fn fixture(poster: Option<MockNativePoster>) -> Fixture {
        let bus = Arc::new(WindowEventBus::new());
        let poster = poster.map(|p| Arc::new(p) as Arc<dyn NativePoster>);
        let bridge = HostedBridge::new(bus.clone(), poster);
        bridge.initialize();
        let store = Arc::new(InMemoryProductStore::new());
        let panel = ScannerPanel::new(bridge, RecordScanUseCase::new(store.clone()));
        panel.attach();
        Fixture { panel, bus, store }
    }

    fn accepting_poster() -> MockNativePoster {
        let mut poster = MockNativePoster::new();
        poster.expect_post_message().returning(|_| Ok(()));
        poster
    }

    #[test]
    fn test_status_message_updates_availability() {
        // Arrange
        let f = fixture(None);
        assert!(!f.panel.state().is_visible());

        // Act
        f.bus.dispatch(&MessageEvent::text(
            r#"{"type":"SCANNER_STATUS","payload":{"available":true,"scanning":true}}"#,
        ));

        // Assert
        let state = f.panel.state();
        assert!(state.is_visible());
        assert!(state.scanning);
    }

    #[test]
    fn test_start_scan_is_optimistic() {
        let mut poster = MockNativePoster::new();
        poster
            .expect_post_message()
            .withf(|text: &str| text == r#"{"type":"SCAN_RFID"}"#)
            .times(1)
            .returning(|_| Ok(()));
        let f = fixture(Some(poster));
        f.panel.apply_error(&RfidErrorPayload::new("old failure", None));

        f.panel.start_scan().unwrap();

        let state = f.panel.state();
        assert!(state.scanning);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_start_scan_outside_native_reports_error() {
        let f = fixture(None);

        let result = f.panel.start_scan();

        assert!(matches!(result, Err(BridgeError::TransportUnavailable(_))));
    }

    #[test]
    fn test_stop_scan_clears_scanning() {
        let f = fixture(Some(accepting_poster()));
        f.panel.start_scan().unwrap();

        f.panel.stop_scan().unwrap();

        assert!(!f.panel.state().scanning);
    }

    #[test]
    fn test_rfid_error_stops_scanning_and_shows_message() {
        let f = fixture(Some(accepting_poster()));
        f.panel.start_scan().unwrap();

        f.bus.dispatch(&MessageEvent::text(
            r#"{"type":"RFID_ERROR","payload":{"message":"Scanner not available","code":"SCANNER_ERROR"}}"#,
        ));

        let state = f.panel.state();
        assert!(!state.scanning);
        assert_eq!(state.error.as_deref(), Some("Scanner not available"));
    }

    #[test]
    fn test_empty_error_message_gets_generic_text() {
        let f = fixture(None);
        f.panel.apply_error(&RfidErrorPayload::new("", Some("SCAN_FAILED")));
        assert_eq!(f.panel.state().error.as_deref(), Some(GENERIC_SCAN_ERROR));
    }

    #[test]
    fn test_known_tag_restocks_product() {
        // Arrange
        let f = fixture(None);
        let product = f
            .store
            .create(ProductInput::new("Widget", 2).with_rfid_tag("E200"))
            .unwrap();

        // Act
        f.bus.dispatch(&MessageEvent::text(
            r#"{"type":"RFID_RESULT","payload":{"epc":"E200","timestamp":1}}"#,
        ));

        // Assert
        let stored = f.store.get(product.id).unwrap().unwrap();
        assert_eq!(stored.quantity, 3);
        let state = f.panel.state();
        assert_eq!(state.last_tag.as_deref(), Some("E200"));
        assert!(matches!(state.last_outcome, Some(ScanOutcome::Restocked(_))));
        assert_eq!(state.pending_tag, None);
    }

    #[test]
    fn test_unknown_tag_is_parked_for_new_product_form() {
        let f = fixture(None);

        let outcome = f.panel.apply_result(&RfidScanResult::captured_now("NEW1"));

        assert_eq!(
            outcome,
            Some(ScanOutcome::Unknown {
                rfid_tag: "NEW1".to_string()
            })
        );
        assert_eq!(f.panel.take_pending_tag().as_deref(), Some("NEW1"));
        assert_eq!(f.panel.take_pending_tag(), None);
    }

    #[test]
    fn test_detach_stops_panel_updates() {
        let f = fixture(None);

        f.panel.detach();
        f.bus.dispatch(&MessageEvent::text(
            r#"{"type":"SCANNER_STATUS","payload":{"available":true,"scanning":false}}"#,
        ));

        assert!(!f.panel.state().available);
    }
}
