//! Event dispatcher: routes received envelopes to registered handlers.
//!
//! Subscriptions are guard-scoped: the `Subscription` returned by
//! `subscribe` removes exactly the handlers it registered when dropped, so a
//! component that goes away cannot leak handlers or unhook anyone else's.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::domain::foundation::{EventEnvelope, EventName, ModuleAction, ValidationError};

type Callback = dyn Fn(&EventEnvelope) + Send + Sync;

/// Routes envelopes to handlers registered by event name.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Mutex<HashMap<String, Vec<(u64, Arc<Callback>)>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event name.
    ///
    /// The handler stays registered until the returned `Subscription` is
    /// dropped or `unsubscribe`d.
    pub fn subscribe(
        self: &Arc<Self>,
        event_name: &str,
        handler: impl Fn(&EventEnvelope) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.register(event_name, Arc::new(handler));
        Subscription {
            dispatcher: Arc::downgrade(self),
            entries: vec![(event_name.to_string(), id)],
        }
    }

    /// Registers one handler for all standard actions of a module.
    ///
    /// Subscribes to `<module>:created`, `:updated`, `:deleted` and
    /// `:completed`; the handler receives the action alongside the envelope.
    /// One guard covers all four registrations.
    pub fn subscribe_module(
        self: &Arc<Self>,
        module: &str,
        handler: impl Fn(ModuleAction, &EventEnvelope) + Send + Sync + 'static,
    ) -> Result<Subscription, ValidationError> {
        let shared: Arc<dyn Fn(ModuleAction, &EventEnvelope) + Send + Sync> = Arc::new(handler);

        let mut entries = Vec::with_capacity(ModuleAction::ALL.len());
        for action in ModuleAction::ALL {
            let name = EventName::from_parts(module, action)?;
            let shared = Arc::clone(&shared);
            let id = self.register(
                name.as_str(),
                Arc::new(move |envelope: &EventEnvelope| shared(action, envelope)),
            );
            entries.push((name.as_str().to_string(), id));
        }

        Ok(Subscription {
            dispatcher: Arc::downgrade(self),
            entries,
        })
    }

    /// Invokes every handler registered for the envelope's event name.
    ///
    /// Handlers run sequentially on the caller's task. Failures are
    /// isolated per handler: a panicking handler is logged and the
    /// remaining handlers still run, and the panic never reaches the
    /// caller's loop. An envelope with no handlers is dropped silently.
    pub fn dispatch(&self, envelope: &EventEnvelope) {
        let callbacks: Vec<Arc<Callback>> = {
            let handlers = self
                .handlers
                .lock()
                .expect("EventDispatcher: handlers lock poisoned");
            handlers
                .get(envelope.event_type.as_str())
                .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        for callback in callbacks {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(envelope))) {
                tracing::error!(
                    event = %envelope.event_type,
                    panic = panic_message(&panic),
                    "Handler panicked, continuing with remaining handlers"
                );
            }
        }
    }

    /// Number of handlers currently registered for an event name.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers
            .lock()
            .expect("EventDispatcher: handlers lock poisoned")
            .get(event_name)
            .map_or(0, Vec::len)
    }

    fn register(&self, event_name: &str, callback: Arc<Callback>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("EventDispatcher: handlers lock poisoned")
            .entry(event_name.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    fn remove(&self, entries: &[(String, u64)]) {
        let mut handlers = self
            .handlers
            .lock()
            .expect("EventDispatcher: handlers lock poisoned");
        for (event_name, id) in entries {
            if let Some(list) = handlers.get_mut(event_name) {
                list.retain(|(handler_id, _)| handler_id != id);
                if list.is_empty() {
                    handlers.remove(event_name);
                }
            }
        }
    }
}

/// Best-effort extraction of a panic payload for logging.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher").finish_non_exhaustive()
    }
}

/// Guard for registered handlers; dropping it unsubscribes them.
#[must_use = "dropping a Subscription immediately removes its handlers"]
#[derive(Debug)]
pub struct Subscription {
    dispatcher: Weak<EventDispatcher>,
    entries: Vec<(String, u64)>,
}

impl Subscription {
    /// Removes this subscription's handlers now.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.remove(&self.entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_handler(counter: &Arc<AtomicUsize>) -> impl Fn(&EventEnvelope) + Send + Sync {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn dispatch_routes_by_event_name() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = dispatcher.subscribe("horses:created", counter_handler(&hits));

        dispatcher.dispatch(&EventEnvelope::test_fixture("horses:created"));
        dispatcher.dispatch(&EventEnvelope::test_fixture("horses:deleted"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn multiple_handlers_all_run() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let _a = dispatcher.subscribe("tasks:updated", counter_handler(&first));
        let _b = dispatcher.subscribe("tasks:updated", counter_handler(&second));

        dispatcher.dispatch(&EventEnvelope::test_fixture("tasks:updated"));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_removes_only_its_handler() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let kept = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));

        let _kept_sub = dispatcher.subscribe("horses:updated", counter_handler(&kept));
        let dropped_sub = dispatcher.subscribe("horses:updated", counter_handler(&dropped));
        assert_eq!(dispatcher.handler_count("horses:updated"), 2);

        dropped_sub.unsubscribe();
        dispatcher.dispatch(&EventEnvelope::test_fixture("horses:updated"));

        assert_eq!(dispatcher.handler_count("horses:updated"), 1);
        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscribe_module_covers_all_standard_actions() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let seen: Arc<Mutex<Vec<ModuleAction>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_in_handler = Arc::clone(&seen);
        let _sub = dispatcher
            .subscribe_module("tasks", move |action, _| {
                seen_in_handler.lock().unwrap().push(action);
            })
            .unwrap();

        for name in [
            "tasks:created",
            "tasks:updated",
            "tasks:deleted",
            "tasks:completed",
        ] {
            dispatcher.dispatch(&EventEnvelope::test_fixture(name));
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ModuleAction::Created,
                ModuleAction::Updated,
                ModuleAction::Deleted,
                ModuleAction::Completed,
            ]
        );
    }

    #[test]
    fn module_subscription_ignores_other_modules() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_in_handler = Arc::clone(&hits);
        let _sub = dispatcher
            .subscribe_module("horses", move |_, _| {
                hits_in_handler.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        dispatcher.dispatch(&EventEnvelope::test_fixture("documents:created"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_module_subscription_removes_all_four() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let sub = dispatcher.subscribe_module("horses", |_, _| {}).unwrap();
        assert_eq!(dispatcher.handler_count("horses:created"), 1);

        drop(sub);

        for name in [
            "horses:created",
            "horses:updated",
            "horses:deleted",
            "horses:completed",
        ] {
            assert_eq!(dispatcher.handler_count(name), 0);
        }
    }

    #[test]
    fn subscribe_module_rejects_empty_module() {
        let dispatcher = Arc::new(EventDispatcher::new());
        assert!(dispatcher.subscribe_module("", |_, _| {}).is_err());
    }

    #[test]
    fn dispatch_with_no_handlers_is_a_noop() {
        let dispatcher = Arc::new(EventDispatcher::new());
        dispatcher.dispatch(&EventEnvelope::test_fixture("sales:created"));
    }

    #[test]
    fn panicking_handler_does_not_starve_siblings() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let _faulty = dispatcher.subscribe("horses:created", |_| panic!("handler bug"));
        let hits = Arc::new(AtomicUsize::new(0));
        let _sibling = dispatcher.subscribe("horses:created", counter_handler(&hits));

        // The sibling receives this event and every later one; the panic
        // stays inside dispatch.
        dispatcher.dispatch(&EventEnvelope::test_fixture("horses:created"));
        dispatcher.dispatch(&EventEnvelope::test_fixture("horses:created"));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
