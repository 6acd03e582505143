//! Per-peer handler registry: message type → the single active handler.
//!
//! Both bridges own one [`HandlerRegistry`].  It is the only routing table in
//! the system:
//!
//! - At most one handler per [`MessageType`].
//! - Registering again for the same type silently replaces the old handler
//!   (last write wins).
//! - Dispatching a type without a handler logs a warning and drops the
//!   message.  Nothing is queued for a handler registered later.
//!
//! # Re-entrancy
//!
//! Handlers are stored as `Arc`s.  [`HandlerRegistry::dispatch`] clones the
//! handler out of the map and releases the lock *before* calling it, so a
//! handler may register, unregister, or send through its own bridge.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::protocol::messages::{decode_payload, Message, MessageType, Payload};

/// A registered callback.  Receives the raw payload (`None` when absent).
pub type Handler = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Outcome of routing one validated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The registered handler ran.
    Handled(MessageType),
    /// No handler was registered; the message was dropped.
    Unhandled(MessageType),
}

impl Dispatch {
    pub fn is_handled(self) -> bool {
        matches!(self, Dispatch::Handled(_))
    }
}

/// Maps each message type to at most one handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<MessageType, Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `message_type`, replacing any previous one.
    pub fn register<F>(&self, message_type: MessageType, handler: F)
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.register_handler(message_type, Arc::new(handler));
    }

    /// Registers an already shared handler.
    pub fn register_handler(&self, message_type: MessageType, handler: Handler) {
        if self.handlers.write().insert(message_type, handler).is_some() {
            debug!("replaced handler for {message_type}");
        }
    }

    /// Registers a typed handler for `P::MESSAGE_TYPE`.
    ///
    /// The payload is decoded before `handler` runs.  A payload that does not
    /// have `P`'s shape is logged and dropped; `handler` is not called.
    pub fn register_typed<P, F>(&self, handler: F)
    where
        P: Payload + 'static,
        F: Fn(P) + Send + Sync + 'static,
    {
        self.register(P::MESSAGE_TYPE, move |payload| {
            match decode_payload::<P>(payload) {
                Ok(decoded) => handler(decoded),
                Err(e) => error!("dropping message: {e}"),
            }
        });
    }

    /// Registers a handler that ignores the payload.
    pub fn register_signal<F>(&self, message_type: MessageType, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(message_type, move |_| handler());
    }

    /// Removes the handler for `message_type`.  Returns whether one existed.
    pub fn unregister(&self, message_type: MessageType) -> bool {
        self.handlers.write().remove(&message_type).is_some()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    pub fn contains(&self, message_type: MessageType) -> bool {
        self.handlers.read().contains_key(&message_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Invokes the handler registered for `message`'s type, exactly once.
    pub fn dispatch(&self, message: &Message) -> Dispatch {
        let message_type = message.message_type;
        // Clone out so the lock is not held while the handler runs.
        let handler = self.handlers.read().get(&message_type).cloned();
        match handler {
            Some(handler) => {
                handler(message.payload.as_ref());
                Dispatch::Handled(message_type)
            }
            None => {
                warn!("no handler registered for message type: {message_type}");
                Dispatch::Unhandled(message_type)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{RfidErrorPayload, RfidScanResult};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(Option<&Value>) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: Option<&Value>| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_dispatch_invokes_handler_once_with_payload() {
        // Arrange
        let registry = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.register(MessageType::ScanRfid, move |payload| {
            sink.lock().push(payload.cloned());
        });

        // Act
        let outcome = registry.dispatch(&Message::with_payload(
            MessageType::ScanRfid,
            json!({"test": true}),
        ));

        // Assert
        assert_eq!(outcome, Dispatch::Handled(MessageType::ScanRfid));
        assert_eq!(*seen.lock(), vec![Some(json!({"test": true}))]);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = HandlerRegistry::new();
        let (first, first_handler) = counter();
        let (second, second_handler) = counter();
        registry.register(MessageType::StopScan, first_handler);
        registry.register(MessageType::StopScan, second_handler);

        registry.dispatch(&Message::new(MessageType::StopScan));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregistered_type_is_reported_unhandled() {
        let registry = HandlerRegistry::new();
        let (count, handler) = counter();
        registry.register(MessageType::RfidError, handler);

        assert!(registry.unregister(MessageType::RfidError));
        let outcome = registry.dispatch(&Message::new(MessageType::RfidError));

        assert_eq!(outcome, Dispatch::Unhandled(MessageType::RfidError));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unregister_missing_type_returns_false() {
        let registry = HandlerRegistry::new();
        assert!(!registry.unregister(MessageType::ScannerStatus));
    }

    #[test]
    fn test_clear_removes_all_handlers() {
        let registry = HandlerRegistry::new();
        let (count, handler) = counter();
        registry.register(MessageType::RfidResult, handler);
        registry.register_signal(MessageType::ScanRfid, || {});

        registry.clear();

        assert!(registry.is_empty());
        assert!(!registry.dispatch(&Message::new(MessageType::RfidResult)).is_handled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_typed_handler_receives_decoded_payload() {
        let registry = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        registry.register_typed(move |err: RfidErrorPayload| {
            *sink.lock() = Some(err);
        });

        registry.dispatch(&Message::with_payload(
            MessageType::RfidError,
            json!({"message": "Scanner not available", "code": "SCANNER_ERROR"}),
        ));

        assert_eq!(*seen.lock(), Some(RfidErrorPayload::scanner_not_available()));
    }

    #[test]
    fn test_typed_handler_skips_malformed_payload() {
        let registry = HandlerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        registry.register_typed(move |_: RfidScanResult| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        // The envelope is valid, so the registry still reports it handled,
        // but the typed callback never sees a payload without an `epc`.
        let outcome = registry.dispatch(&Message::with_payload(
            MessageType::RfidResult,
            json!({"rssi": -40}),
        ));

        assert!(outcome.is_handled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_reregister_itself_during_dispatch() {
        // Arrange: a handler that replaces itself while running must not deadlock.
        let registry = Arc::new(HandlerRegistry::new());
        let (count, replacement) = counter();
        let replacement = Arc::new(replacement);
        let reg = Arc::clone(&registry);
        registry.register(MessageType::ScanRfid, move |_| {
            let r = Arc::clone(&replacement);
            reg.register(MessageType::ScanRfid, move |p| r(p));
        });

        // Act
        registry.dispatch(&Message::new(MessageType::ScanRfid));
        registry.dispatch(&Message::new(MessageType::ScanRfid));

        // Assert: the second dispatch reached the replacement
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
