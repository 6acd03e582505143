//! WindowEventBus: an in-process window `message` event target.
//!
//! Listeners are called in subscription order.  The listener list is
//! snapshotted before dispatch, so a listener may subscribe or unsubscribe
//! (including itself) while an event is being delivered; the change takes
//! effect from the next event.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::application::hosted_bridge::{
    EventListener, ListenerId, MessageEvent, MessageEventSource,
};

#[derive(Default)]
pub struct WindowEventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, EventListener)>>,
}

impl WindowEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every current listener.  Returns how many ran.
    pub fn dispatch(&self, event: &MessageEvent) -> usize {
        let listeners: Vec<EventListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        trace!("dispatching window message to {} listener(s)", listeners.len());
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl MessageEventSource for WindowEventBus {
    fn subscribe(&self, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_reaches_listeners_in_order() {
        // Arrange
        let bus = WindowEventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(Arc::new(move |_: &MessageEvent| order.lock().push(n)));
        }

        // Act
        let delivered = bus.dispatch(&MessageEvent::text("{}"));

        // Assert
        assert_eq!(delivered, 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let bus = WindowEventBus::new();
        let a = bus.subscribe(Arc::new(|_: &MessageEvent| {}));
        let _b = bus.subscribe(Arc::new(|_: &MessageEvent| {}));

        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_during_dispatch() {
        let bus = Arc::new(WindowEventBus::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let (b, s) = (Arc::clone(&bus), Arc::clone(&slot));
        let id = bus.subscribe(Arc::new(move |_: &MessageEvent| {
            if let Some(id) = *s.lock() {
                b.unsubscribe(id);
            }
        }));
        *slot.lock() = Some(id);

        bus.dispatch(&MessageEvent::text("{}"));

        assert_eq!(bus.listener_count(), 0);
    }
}
