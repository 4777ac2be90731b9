//! Tenant-scoped fan-out hub.
//!
//! The hub is the single meeting point between mutation paths (publish) and
//! stream transports (register/unregister). Publishing enqueues onto each
//! subscriber's own bounded queue and returns; it never awaits transport
//! progress, so one stalled client cannot slow another or the publisher.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::foundation::{ConnectionId, EventEnvelope, TenantId, Timestamp, UserId};
use crate::ports::RealtimePublisher;

use super::queue::PushOutcome;
use super::registry::{Subscriber, SubscriberRegistry};

/// Central broadcast hub. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct BroadcastHub {
    registry: SubscriberRegistry,
    queue_capacity: usize,
}

impl BroadcastHub {
    /// Creates a hub whose subscribers each buffer at most `queue_capacity`
    /// undelivered events.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: SubscriberRegistry::new(),
            queue_capacity,
        }
    }

    /// Registers a new subscriber under the session's tenant scope.
    ///
    /// Queue attachment and registry insertion happen together, so an event
    /// published immediately after this call returns is already queued for
    /// the new subscriber.
    pub fn register(&self, tenant: TenantId, user: UserId) -> Arc<Subscriber> {
        let subscriber = Arc::new(Subscriber::new(tenant, user, self.queue_capacity));
        self.registry.insert(Arc::clone(&subscriber));
        info!(
            connection_id = %subscriber.id(),
            tenant = %subscriber.tenant(),
            user = %subscriber.user(),
            subscribers_in_scope = self.registry.count(subscriber.tenant()),
            "Subscriber registered"
        );
        subscriber
    }

    /// Removes a subscriber and closes its queue.
    ///
    /// Idempotent: unregistering an unknown or already-removed connection is
    /// a no-op. Events published after removal are not delivered to it.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        match self.registry.remove(connection_id) {
            Some(subscriber) => {
                subscriber.close();
                info!(
                    connection_id = %connection_id,
                    tenant = %subscriber.tenant(),
                    "Subscriber unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Enqueues an event for every subscriber in the tenant scope.
    ///
    /// Returns the number of subscribers the event was enqueued for. Zero
    /// subscribers is normal, not an error.
    pub fn publish_to_scope(&self, tenant: &TenantId, event: EventEnvelope) -> usize {
        let subscribers = self.registry.in_scope(tenant);
        if subscribers.is_empty() {
            debug!(tenant = %tenant, event = %event.event_type, "No subscribers in scope");
            return 0;
        }

        let mut delivered = 0;
        for subscriber in &subscribers {
            match subscriber.enqueue(event.clone()) {
                PushOutcome::Enqueued => delivered += 1,
                PushOutcome::DroppedOldest => {
                    delivered += 1;
                    warn!(
                        connection_id = %subscriber.id(),
                        tenant = %tenant,
                        event = %event.event_type,
                        "Subscriber queue full, dropped oldest unsent event"
                    );
                }
                PushOutcome::Closed => {
                    debug!(
                        connection_id = %subscriber.id(),
                        "Skipped closed subscriber queue"
                    );
                }
            }
        }

        debug!(
            tenant = %tenant,
            event = %event.event_type,
            delivered,
            "Event fanned out"
        );
        delivered
    }

    /// Number of live subscribers in one tenant scope.
    pub fn subscriber_count(&self, tenant: &TenantId) -> usize {
        self.registry.count(tenant)
    }

    /// Number of live subscribers across all tenants.
    pub fn total_subscriber_count(&self) -> usize {
        self.registry.total()
    }

    /// Tenant scopes with at least one live subscriber.
    pub fn active_tenants(&self) -> Vec<TenantId> {
        self.registry.active_tenants()
    }

    /// Unregisters every subscriber idle for longer than `max_idle`.
    ///
    /// Intended to run periodically. Activity is tracked on event enqueue
    /// and delivery only, so a connection that has seen no events for the
    /// whole window is reaped even when its transport is healthy: closing
    /// its queue ends the stream, and the client treats that as a
    /// transport error and reconnects with a fresh registration.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Timestamp::now().minus_secs(max_idle.as_secs());
        let stale: Vec<Arc<Subscriber>> = self
            .registry
            .all()
            .into_iter()
            .filter(|s| s.last_activity().is_before(&cutoff))
            .collect();

        let mut reaped = 0;
        for subscriber in stale {
            if self.unregister(&subscriber.id()) {
                reaped += 1;
            }
        }
        if reaped > 0 {
            info!(reaped, "Reaped idle subscribers");
        }
        reaped
    }
}

impl RealtimePublisher for BroadcastHub {
    fn publish(&self, tenant: &TenantId, event: EventEnvelope) {
        self.publish_to_scope(tenant, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EventName;
    use serde_json::json;

    fn tenant(name: &str) -> TenantId {
        TenantId::new(name).unwrap()
    }

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    fn event(name: &str, id: u64) -> EventEnvelope {
        EventEnvelope::new(EventName::new(name).unwrap(), json!({ "id": id }))
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_in_scope() {
        let hub = BroadcastHub::new(8);
        let first = hub.register(tenant("stable-a"), user("rider-1"));
        let second = hub.register(tenant("stable-a"), user("rider-2"));

        let delivered = hub.publish_to_scope(&tenant("stable-a"), event("horses:created", 1));

        assert_eq!(delivered, 2);
        assert_eq!(first.next_event().await.unwrap().payload["id"], 1);
        assert_eq!(second.next_event().await.unwrap().payload["id"], 1);
    }

    #[tokio::test]
    async fn publish_is_tenant_isolated() {
        let hub = BroadcastHub::new(8);
        let ours = hub.register(tenant("stable-a"), user("rider-1"));
        let theirs = hub.register(tenant("stable-b"), user("rider-9"));

        hub.publish_to_scope(&tenant("stable-a"), event("horses:created", 1));

        assert_eq!(ours.pending_events(), 1);
        assert_eq!(theirs.pending_events(), 0);
    }

    #[test]
    fn publish_with_no_subscribers_is_a_noop() {
        let hub = BroadcastHub::new(8);
        let delivered = hub.publish_to_scope(&tenant("stable-a"), event("horses:created", 1));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn slow_subscriber_keeps_freshest_events() {
        let hub = BroadcastHub::new(2);
        let slow = hub.register(tenant("stable-a"), user("rider-1"));

        for n in 1..=4 {
            hub.publish_to_scope(&tenant("stable-a"), event("tasks:updated", n));
        }

        // Capacity 2: events 1 and 2 were dropped oldest-first.
        assert_eq!(slow.next_event().await.unwrap().payload["id"], 3);
        assert_eq!(slow.next_event().await.unwrap().payload["id"], 4);
    }

    #[tokio::test]
    async fn unregister_stops_delivery_and_is_idempotent() {
        let hub = BroadcastHub::new(8);
        let sub = hub.register(tenant("stable-a"), user("rider-1"));
        let id = sub.id();

        assert!(hub.unregister(&id));
        assert!(!hub.unregister(&id));

        let delivered = hub.publish_to_scope(&tenant("stable-a"), event("horses:created", 1));
        assert_eq!(delivered, 0);
        assert!(sub.next_event().await.is_none());
    }

    #[test]
    fn counts_track_registrations() {
        let hub = BroadcastHub::new(8);
        assert_eq!(hub.total_subscriber_count(), 0);

        let a = hub.register(tenant("stable-a"), user("rider-1"));
        let _b = hub.register(tenant("stable-b"), user("rider-2"));

        assert_eq!(hub.subscriber_count(&tenant("stable-a")), 1);
        assert_eq!(hub.total_subscriber_count(), 2);

        hub.unregister(&a.id());
        assert_eq!(hub.subscriber_count(&tenant("stable-a")), 0);
        assert_eq!(hub.total_subscriber_count(), 1);
    }

    #[test]
    fn reap_idle_leaves_active_subscribers() {
        let hub = BroadcastHub::new(8);
        let active = hub.register(tenant("stable-a"), user("rider-1"));
        active.enqueue(EventEnvelope::test_fixture("horses:created"));

        // Freshly registered subscribers are well within any idle window.
        let reaped = hub.reap_idle(Duration::from_secs(300));
        assert_eq!(reaped, 0);
        assert_eq!(hub.total_subscriber_count(), 1);
    }

    #[tokio::test]
    async fn reap_idle_removes_quiet_subscribers_and_ends_their_stream() {
        let hub = BroadcastHub::new(8);
        let quiet = hub.register(tenant("stable-a"), user("rider-1"));

        tokio::time::sleep(Duration::from_millis(5)).await;
        // Zero window: any subscriber with no event traffic is past it.
        let reaped = hub.reap_idle(Duration::from_secs(0));

        assert_eq!(reaped, 1);
        assert_eq!(hub.total_subscriber_count(), 0);
        // The closed queue ends the delivery stream, which is what tells
        // the transport (and ultimately the client) to reconnect.
        assert!(quiet.next_event().await.is_none());
    }
}
