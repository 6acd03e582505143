//! HostBridge: the native-shell side of the WebView message bridge.
//!
//! # How the shell talks to the page (for beginners)
//!
//! The page and the shell run in separate execution contexts.  The only
//! ways across are:
//!
//! ```text
//! Shell → Page:  surface.inject_javascript("window.postMessage(<json>, '*')")
//! Page  → Shell: window.ReactNativeWebView.postMessage("<json>")
//!                  └─► native onMessage callback ─► HostBridge::receive
//! ```
//!
//! Sending therefore means *encoding* a [`Message`] to JSON and asking the
//! browser surface to run a small script that re-posts it inside the page.
//! Receiving means parsing the string carried by the native callback event.
//!
//! # Surface lifetime
//!
//! The bridge only holds a [`Weak`] reference to the surface.  The surface is
//! owned by the screen that displays it; when that screen tears the surface
//! down, sends start failing with [`BridgeError::TransportUnavailable`]
//! instead of reaching a dead view.  Nothing panics.
//!
//! # Failure policy
//!
//! Every failure is logged through `tracing` and returned.  None of them is
//! retried, queued or reported back to the page.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use stockscan_core::protocol::{
    decode_text, encode, injection_script, message_from_value, BridgeError, Direction,
    DirectionPolicy, Dispatch, HandlerRegistry, Message, MessageType, Payload, RfidErrorPayload,
    RfidScanResult, ScannerStatus,
};

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Error reported by a browser surface when it cannot run a script.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface exists but its page is gone (navigation, crash, unmount).
    #[error("browser surface is detached")]
    Detached,

    #[error("script execution failed: {0}")]
    Execution(String),
}

/// A browser surface able to run script inside the hosted page.
///
/// Fire-and-forget: `Ok` only means the script was accepted for execution.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptSurface: Send + Sync {
    fn inject_javascript(&self, script: &str) -> Result<(), SurfaceError>;
}

/// The native callback event fired when the page posts a message.
///
/// Mirrors the `nativeEvent` of a WebView `onMessage` callback: the page can
/// only post strings, so `data` is always text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMessageEvent {
    pub data: String,
}

impl NativeMessageEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

// ── HostBridge ────────────────────────────────────────────────────────────────

/// The outer (native shell) bridge.
///
/// Construct one per screen that displays the page, hand it the surface with
/// [`set_surface`](Self::set_surface), forward the surface's message
/// callback to [`receive`](Self::receive), and call
/// [`cleanup`](Self::cleanup) when the screen goes away.
#[derive(Default)]
pub struct HostBridge {
    surface: RwLock<Option<Weak<dyn ScriptSurface>>>,
    registry: HandlerRegistry,
    policy: DirectionPolicy,
}

impl HostBridge {
    /// Creates a bridge that accepts every message type in both directions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bridge restricted by `policy`.
    pub fn with_policy(policy: DirectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &DirectionPolicy {
        &self.policy
    }

    // ── Surface ───────────────────────────────────────────────────────────────

    /// Points the bridge at `surface`, replacing any previous one.
    ///
    /// Only a weak reference is kept; the caller keeps the surface alive.
    pub fn set_surface(&self, surface: &Arc<dyn ScriptSurface>) {
        *self.surface.write() = Some(Arc::downgrade(surface));
        debug!("host bridge attached to browser surface");
    }

    /// Alias of [`set_surface`](Self::set_surface); may be called again when
    /// the screen recreates its surface.
    pub fn initialize(&self, surface: &Arc<dyn ScriptSurface>) {
        self.set_surface(surface);
    }

    /// Forgets the current surface.
    pub fn clear_surface(&self) {
        *self.surface.write() = None;
    }

    /// Returns `true` if a surface is set and still alive.
    pub fn has_live_surface(&self) -> bool {
        self.live_surface().is_some()
    }

    fn live_surface(&self) -> Option<Arc<dyn ScriptSurface>> {
        self.surface.read().as_ref().and_then(Weak::upgrade)
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Sends `message` into the page.
    ///
    /// A [`Message`] always carries a known type, so the envelope check is
    /// already satisfied; use [`send_value`](Self::send_value) for untyped
    /// input.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::DirectionNotAllowed`] if the policy filters the type.
    /// - [`BridgeError::TransportUnavailable`] if no live surface is set.
    /// - [`BridgeError::Serialize`] / [`BridgeError::Transport`] on encoding
    ///   or script execution failure.
    ///
    /// Every error is also logged; callers may ignore the result.
    pub fn send(&self, message: &Message) -> Result<(), BridgeError> {
        self.deliver(message).map_err(report)
    }

    /// Validates an untyped JSON value and sends it into the page.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Invalid`] without touching the surface when
    /// `value` fails the envelope check, otherwise as [`send`](Self::send).
    pub fn send_value(&self, value: Value) -> Result<(), BridgeError> {
        message_from_value(value)
            .map_err(BridgeError::from)
            .and_then(|message| self.deliver(&message))
            .map_err(report)
    }

    fn deliver(&self, message: &Message) -> Result<(), BridgeError> {
        self.policy.check(Direction::Outbound, message.message_type)?;
        let surface = self
            .live_surface()
            .ok_or(BridgeError::TransportUnavailable("WebView reference not set"))?;
        let json = encode(message)?;
        surface
            .inject_javascript(&injection_script(&json))
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        debug!("sent {} to web", message.message_type);
        Ok(())
    }

    fn send_payload<P: Payload>(&self, payload: &P) -> Result<(), BridgeError> {
        let message = Message::from_payload(payload).map_err(|e| report(e.into()))?;
        self.send(&message)
    }

    /// Sends a tag read as `RFID_RESULT`.
    pub fn send_rfid_result(&self, result: &RfidScanResult) -> Result<(), BridgeError> {
        self.send_payload(result)
    }

    /// Sends a scanner failure as `RFID_ERROR`.
    pub fn send_rfid_error(&self, error: &RfidErrorPayload) -> Result<(), BridgeError> {
        self.send_payload(error)
    }

    /// Sends a hardware state snapshot as `SCANNER_STATUS`.
    pub fn send_scanner_status(&self, status: &ScannerStatus) -> Result<(), BridgeError> {
        self.send_payload(status)
    }

    /// Sends `SCAN_RFID`.  Unusual from the shell, but the contract allows it.
    pub fn send_scan_request(&self) -> Result<(), BridgeError> {
        self.send(&Message::new(MessageType::ScanRfid))
    }

    /// Sends `STOP_SCAN`.  Unusual from the shell, but the contract allows it.
    pub fn send_stop_scan_request(&self) -> Result<(), BridgeError> {
        self.send(&Message::new(MessageType::StopScan))
    }

    // ── Receiving ─────────────────────────────────────────────────────────────

    /// Handles a message posted by the page.
    ///
    /// Returns [`Dispatch::Unhandled`] (and logs a warning) when the type is
    /// valid but nothing is registered for it.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Malformed`] if `event.data` is not JSON.
    /// - [`BridgeError::Invalid`] if it fails the envelope check.
    /// - [`BridgeError::DirectionNotAllowed`] if the policy filters the type.
    ///
    /// In every error case the message is dropped.
    pub fn receive(&self, event: &NativeMessageEvent) -> Result<Dispatch, BridgeError> {
        decode_text(&event.data)
            .and_then(|message| {
                self.policy.check(Direction::Inbound, message.message_type)?;
                Ok(message)
            })
            .map(|message| self.registry.dispatch(&message))
            .map_err(|e| {
                error!("dropping message from web: {e}");
                e
            })
    }

    // ── Handler registration ─────────────────────────────────────────────────

    /// Registers a raw handler for `message_type` (last registration wins).
    pub fn register_handler<F>(&self, message_type: MessageType, handler: F)
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.registry.register(message_type, handler);
    }

    /// Removes the handler for `message_type`.  Returns whether one existed.
    pub fn unregister_handler(&self, message_type: MessageType) -> bool {
        self.registry.unregister(message_type)
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    /// Runs `callback` whenever the page asks to start scanning.
    pub fn on_scan_request<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_signal(MessageType::ScanRfid, move || {
            debug!("received SCAN_RFID request from web");
            callback();
        });
    }

    /// Runs `callback` whenever the page asks to stop scanning.
    pub fn on_stop_scan_request<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_signal(MessageType::StopScan, move || {
            debug!("received STOP_SCAN request from web");
            callback();
        });
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

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Drops every handler and the surface reference.  Safe to call repeatedly.
    pub fn cleanup(&self) {
        self.registry.clear();
        self.clear_surface();
        debug!("host bridge cleaned up");
    }
}

/// Logs a send failure at error level and passes it through.
fn report(err: BridgeError) -> BridgeError {
    error!("failed to send message to web: {err}");
    err
}

// ── Tests ─────────────────────────────────────────────────────────────────────
