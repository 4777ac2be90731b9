//! Bounded per-subscriber outbound queue.
//!
//! Every subscriber owns one queue; the hub enqueues on the publish path and
//! the stream transport drains. The queue is the backpressure boundary: a
//! stalled client never grows memory unboundedly, and never slows delivery
//! to any other subscriber. On overflow the oldest *unsent* event is dropped
//! (bounded-staleness degradation), so the queue always keeps the freshest
//! events.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::domain::foundation::EventEnvelope;

/// Result of enqueueing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Event enqueued within capacity.
    Enqueued,
    /// Event enqueued; the oldest unsent event was dropped to make room.
    DroppedOldest,
    /// Queue already closed; event discarded.
    Closed,
}

#[derive(Debug)]
struct QueueState {
    events: VecDeque<EventEnvelope>,
    closed: bool,
}

/// Bounded FIFO of undelivered events with a single async consumer.
#[derive(Debug)]
pub struct OutboundQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl OutboundQueue {
    /// Creates a queue holding at most `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Enqueues an event, dropping the oldest unsent event on overflow.
    ///
    /// Never blocks; safe to call from any publish path.
    pub fn push(&self, event: EventEnvelope) -> PushOutcome {
        let outcome = {
            let mut state = self.state.lock().expect("OutboundQueue: state lock poisoned");
            if state.closed {
                return PushOutcome::Closed;
            }

            let outcome = if state.events.len() >= self.capacity {
                state.events.pop_front();
                PushOutcome::DroppedOldest
            } else {
                PushOutcome::Enqueued
            };
            state.events.push_back(event);
            outcome
        };

        self.notify.notify_one();
        outcome
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<EventEnvelope> {
        loop {
            // Arm the notification before checking state so a push between
            // the check and the await is not lost.
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().expect("OutboundQueue: state lock poisoned");
                if let Some(event) = state.events.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Closes the queue; pending events remain receivable, new pushes are
    /// discarded. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.state.lock().expect("OutboundQueue: state lock poisoned");
            state.closed = true;
        }
        self.notify.notify_one();
    }

    /// Number of undelivered events.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("OutboundQueue: state lock poisoned")
            .events
            .len()
    }

    /// True if no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .expect("OutboundQueue: state lock poisoned")
            .closed
    }
}
