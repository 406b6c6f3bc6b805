//! Publish/subscribe fabric between the engine and its observers
//!
//! Scoring, move history, sound and network broadcast all hang off the bus
//! instead of being wired into the game loop.
//!
//! # Contract
//!
//! - A handler is registered at most once per event type; registering the
//!   same [`Handler`] (same `Arc`) again is a no-op.
//! - `publish` calls the handlers of the event's type in registration order,
//!   synchronously, on the caller's thread.
//! - A handler returning an error *or panicking* is logged and skipped; the
//!   remaining handlers still run and nothing reaches the publisher.
//!
//! Handlers run without the registry lock held, so a handler may itself
//! subscribe or unsubscribe; the change applies from the next publish.

use crate::game::events::{Event, EventType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Shared event callback
pub type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventType, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`; returns `false` if it already was
    pub fn subscribe(&self, kind: EventType, handler: Handler) -> bool {
        let mut subscribers = self.subscribers.write();
        let list = subscribers.entry(kind).or_default();
        if list.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
            return false;
        }
        list.push(handler);
        true
    }

    /// Remove `handler` from `kind`; returns whether it was registered
    pub fn unsubscribe(&self, kind: EventType, handler: &Handler) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|existing| !Arc::ptr_eq(existing, handler));
        before != list.len()
    }

    /// Deliver `event` to every handler of its type
    pub fn publish(&self, event: &Event) {
        let handlers: Vec<Handler> = self
            .subscribers
            .read()
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();

        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        "[EVENT_BUS] Handler #{} for {} failed: {:#} - continuing",
                        index, event.kind, e
                    );
                }
                Err(_) => {
                    error!(
                        "[EVENT_BUS] Handler #{} for {} panicked - continuing",
                        index, event.kind
                    );
                }
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventType) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read();
        let mut counts: Vec<_> = subscribers.iter().map(|(k, v)| (*k, v.len())).collect();
        counts.sort();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Handler {
        let log = Arc::clone(log);
        handler(move |event| {
            log.lock().push(format!("{}:{}", tag, event.kind));
            Ok(())
        })
    }

    #[test]
    fn test_duplicate_subscription_is_noop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "a");

        assert!(bus.subscribe(EventType::PieceMoved, h.clone()));
        assert!(!bus.subscribe(EventType::PieceMoved, h.clone()));
        assert_eq!(bus.subscriber_count(EventType::PieceMoved), 1);

        bus.publish(&Event::new(EventType::PieceMoved, 0));
        assert_eq!(log.lock().len(), 1, "handler runs once per publish");
    }

    #[test]
    fn test_same_handler_on_two_types() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "a");
        assert!(bus.subscribe(EventType::GameStarted, h.clone()));
        assert!(bus.subscribe(EventType::GameEnded, h));

        bus.publish(&Event::new(EventType::GameEnded, 0));
        assert_eq!(*log.lock(), vec!["a:GAME_ENDED".to_string()]);
    }

    #[test]
    fn test_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventType::TurnChanged, recorder(&log, "first"));
        bus.subscribe(EventType::TurnChanged, recorder(&log, "second"));

        bus.publish(&Event::new(EventType::TurnChanged, 0));
        assert_eq!(
            *log.lock(),
            vec!["first:TURN_CHANGED".to_string(), "second:TURN_CHANGED".to_string()]
        );
    }

    #[test]
    fn test_failing_and_panicking_handlers_are_isolated() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(
            EventType::PieceCaptured,
            handler(|_| Err(anyhow::anyhow!("observer offline"))),
        );
        bus.subscribe(EventType::PieceCaptured, handler(|_| panic!("observer bug")));
        bus.subscribe(EventType::PieceCaptured, recorder(&log, "survivor"));

        bus.publish(&Event::new(EventType::PieceCaptured, 0));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder(&log, "a");
        bus.subscribe(EventType::PieceMoved, h.clone());
        bus.subscribe(EventType::GameStarted, recorder(&log, "b"));

        assert!(bus.unsubscribe(EventType::PieceMoved, &h));
        assert!(!bus.unsubscribe(EventType::PieceMoved, &h));
        bus.publish(&Event::new(EventType::PieceMoved, 0));
        assert!(log.lock().is_empty());

        bus.clear();
        assert_eq!(bus.subscriber_count(EventType::GameStarted), 0);
    }
}
