//! HostedBridge: the page side of the WebView message bridge.
//!
//! # How the page talks to the shell (for beginners)
//!
//! ```text
//! Page  → Shell:  window.ReactNativeWebView.postMessage("<json>")   (NativePoster)
//! Shell → Page:   window 'message' event, data = "<json>" or object  (MessageEventSource)
//! ```
//!
//! The page never holds a reference to the shell.  Outbound it relies on a
//! single bridging primitive injected by the native WebView; when the page
//! is opened in an ordinary browser that primitive is absent, and every send
//! logs a warning and returns [`BridgeError::TransportUnavailable`].
//!
//! Inbound, the page listens on its window.  Browsers may hand over either
//! the posted string or an already-parsed object, so [`EventData`] accepts
//! both and both are normalised into a [`Message`] before the shared
//! validation and dispatch.
//!
//! # Lifecycle
//!
//! ```text
//! HostedBridge::new ─► initialize() ─► … messages … ─► cleanup()
//!                        subscribes                     unsubscribes
//!                        exactly once                   and clears handlers
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use stockscan_core::protocol::{
    decode_text, encode, message_from_value, BridgeError, Direction, DirectionPolicy, Dispatch,
    HandlerRegistry, Message, MessageType, Payload, RfidErrorPayload, RfidScanResult,
    ScannerStatus,
};

// ── Transport types ───────────────────────────────────────────────────────────

/// Payload of a window `message` event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// The string exactly as posted.
    Text(String),
    /// A value the environment already parsed.
    Structured(Value),
}

/// A window `message` event.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub data: EventData,
}

impl MessageEvent {
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: EventData::Text(data.into()),
        }
    }

    pub fn structured(data: Value) -> Self {
        Self {
            data: EventData::Structured(data),
        }
    }
}

/// Identifies one subscription on a [`MessageEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A window `message` listener.
pub type EventListener = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

/// The page's global inbound event channel.
pub trait MessageEventSource: Send + Sync {
    fn subscribe(&self, listener: EventListener) -> ListenerId;

    /// Removes a listener.  Returns whether it was subscribed.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Error returned by the native bridging primitive.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("native channel closed")]
    Closed,

    #[error("native channel rejected message: {0}")]
    Rejected(String),
}

/// The bridging primitive the native WebView injects into the page.
#[cfg_attr(test, mockall::automock)]
pub trait NativePoster: Send + Sync {
    fn post_message(&self, text: &str) -> Result<(), TransportError>;
}

// ── HostedBridge ──────────────────────────────────────────────────────────────

/// The inner (hosted page) bridge.
pub struct HostedBridge {
    events: Arc<dyn MessageEventSource>,
    poster: Option<Arc<dyn NativePoster>>,
    registry: HandlerRegistry,
    policy: DirectionPolicy,
    subscription: Mutex<Option<ListenerId>>,
}

impl HostedBridge {
    /// Creates a bridge.  `poster` is `None` when the page is not running
    /// inside the native WebView.
    pub fn new(
        events: Arc<dyn MessageEventSource>,
        poster: Option<Arc<dyn NativePoster>>,
    ) -> Arc<Self> {
        Self::with_policy(events, poster, DirectionPolicy::permissive())
    }

    pub fn with_policy(
        events: Arc<dyn MessageEventSource>,
        poster: Option<Arc<dyn NativePoster>>,
        policy: DirectionPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            events,
            poster,
            registry: HandlerRegistry::new(),
            policy,
            subscription: Mutex::new(None),
        })
    }

    /// Returns `true` if the native bridging primitive is present.
    pub fn is_native(&self) -> bool {
        self.poster.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Subscribes to window `message` events.  Calling it again is a no-op.
    ///
    /// The listener holds a weak reference to the bridge.  Dropping the
    /// last `Arc` unsubscribes it even if [`cleanup`](Self::cleanup) was
    /// never called.
    pub fn initialize(self: &Arc<Self>) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            debug!("hosted bridge already initialized");
            return;
        }
        let bridge: Weak<Self> = Arc::downgrade(self);
        let id = self.events.subscribe(Arc::new(move |event: &MessageEvent| {
            if let Some(bridge) = bridge.upgrade() {
                let _ = bridge.handle_event(event);
            }
        }));
        *subscription = Some(id);
        debug!("hosted bridge listening for window messages");
    }

    /// Unsubscribes from window events and drops every handler.
    /// Safe to call repeatedly, and before [`initialize`](Self::initialize).
    pub fn cleanup(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.events.unsubscribe(id);
        }
        self.registry.clear();
        debug!("hosted bridge cleaned up");
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Posts `message` to the shell.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::DirectionNotAllowed`] if the policy filters the type.
    /// - [`BridgeError::TransportUnavailable`] outside the native WebView
    ///   (logged as a warning, not an error).
    /// - [`BridgeError::Serialize`] / [`BridgeError::Transport`] otherwise.
    pub fn send(&self, message: &Message) -> Result<(), BridgeError> {
        self.deliver(message).map_err(report)
    }

    /// Validates an untyped JSON value and posts it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Invalid`] without posting when `value` fails
    /// the envelope check, otherwise as [`send`](Self::send).
    pub fn send_value(&self, value: Value) -> Result<(), BridgeError> {
        message_from_value(value)
            .map_err(BridgeError::from)
            .and_then(|message| self.deliver(&message))
            .map_err(report)
    }

    fn deliver(&self, message: &Message) -> Result<(), BridgeError> {
        self.policy.check(Direction::Outbound, message.message_type)?;
        let poster = self
            .poster
            .as_ref()
            .ok_or(BridgeError::TransportUnavailable("Not running in native WebView"))?;
        let text = encode(message)?;
        poster
            .post_message(&text)
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        debug!("sent {} to native", message.message_type);
        Ok(())
    }

    fn send_payload<P: Payload>(&self, payload: &P) -> Result<(), BridgeError> {
        let message = Message::from_payload(payload).map_err(|e| report(e.into()))?;
        self.send(&message)
    }

    /// Asks the shell to start scanning (`SCAN_RFID`, no payload).
    pub fn send_scan_request(&self) -> Result<(), BridgeError> {
        self.send(&Message::new(MessageType::ScanRfid))
    }

    /// Asks the shell to stop scanning (`STOP_SCAN`, no payload).
    pub fn send_stop_scan_request(&self) -> Result<(), BridgeError> {
        self.send(&Message::new(MessageType::StopScan))
    }

    pub fn start_rfid_scan(&self) -> Result<(), BridgeError> {
        self.send_scan_request()
    }

    pub fn stop_rfid_scan(&self) -> Result<(), BridgeError> {
        self.send_stop_scan_request()
    }

    /// Unusual from the page, but the contract allows it.
    pub fn send_rfid_result(&self, result: &RfidScanResult) -> Result<(), BridgeError> {
        self.send_payload(result)
    }

    pub fn send_rfid_error(&self, error: &RfidErrorPayload) -> Result<(), BridgeError> {
        self.send_payload(error)
    }

    pub fn send_scanner_status(&self, status: &ScannerStatus) -> Result<(), BridgeError> {
        self.send_payload(status)
    }

    // ── Receiving ─────────────────────────────────────────────────────────────

    /// Handles one window `message` event.
    ///
    /// Called by the subscription set up in [`initialize`](Self::initialize);
    /// public so that embedders with their own event plumbing can feed it.
    ///
    /// # Errors
    ///
    /// Malformed, invalid and direction-filtered messages are logged, dropped
    /// and returned as errors.
    pub fn handle_event(&self, event: &MessageEvent) -> Result<Dispatch, BridgeError> {
        let decoded = match &event.data {
            EventData::Text(text) => decode_text(text),
            EventData::Structured(value) => {
                message_from_value(value.clone()).map_err(BridgeError::from)
            }
        };
        decoded
            .and_then(|message| {
                self.policy.check(Direction::Inbound, message.message_type)?;
                Ok(message)
            })
            .map(|message| self.registry.dispatch(&message))
            .map_err(|e| {
                error!("dropping message from native: {e}");
                e
            })
    }

    // ── Handler registration ─────────────────────────────────────────────────

    pub fn register_handler<F>(&self, message_type: MessageType, handler: F)
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.registry.register(message_type, handler);
    }

    pub fn unregister_handler(&self, message_type: MessageType) -> bool {
        self.registry.unregister(message_type)
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    pub fn on_rfid_result<F>(&self, handler: F)
    where
        F: Fn(RfidScanResult) + Send + Sync + 'static,
    {
        self.registry.register_typed(handler);
    }

    pub fn on_rfid_error<F>(&self, handler: F)
    where
        F: Fn(RfidErrorPayload) + Send + Sync + 'static,
    {
        self.registry.register_typed(handler);
    }

    pub fn on_scanner_status<F>(&self, handler: F)
    where
        F: Fn(ScannerStatus) + Send + Sync + 'static,
    {
        self.registry.register_typed(handler);
    }

    pub fn on_scan_request<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_signal(MessageType::ScanRfid, callback);
    }

    pub fn on_stop_scan_request<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_signal(MessageType::StopScan, callback);
    }
}

impl Drop for HostedBridge {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            self.events.unsubscribe(id);
            debug!("hosted bridge dropped without cleanup; listener removed");
        }
    }
}

/// Missing transport is expected in a plain browser, so it only warns.
fn report(err: BridgeError) -> BridgeError {
    match &err {
        BridgeError::TransportUnavailable(reason) => warn!("{reason}"),
        other => error!("failed to send message to native: {other}"),
    }
    err
}

// ── Tests ─────────────────────────────────────────────────────────────────────
