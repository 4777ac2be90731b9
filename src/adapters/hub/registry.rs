//! Subscriber bookkeeping, scoped by tenant.
//!
//! The registry exclusively owns `Subscriber` entries; the stream transport
//! only holds an `Arc` handle it must not rely on to keep the entry
//! registered. Locks guard bookkeeping only: event delivery happens on the
//! subscriber's own queue, outside any registry lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::foundation::{ConnectionId, EventEnvelope, TenantId, Timestamp, UserId};

use super::queue::{OutboundQueue, PushOutcome};

/// One live stream connection.
///
/// Created when the hub admits a connection, destroyed on transport error,
/// explicit close, or idle timeout.
#[derive(Debug)]
pub struct Subscriber {
    id: ConnectionId,
    tenant: TenantId,
    user: UserId,
    queue: OutboundQueue,
    connected_at: Timestamp,
    last_activity: Mutex<Timestamp>,
}

impl Subscriber {
    pub(crate) fn new(tenant: TenantId, user: UserId, queue_capacity: usize) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConnectionId::new(),
            tenant,
            user,
            queue: OutboundQueue::new(queue_capacity),
            connected_at: now,
            last_activity: Mutex::new(now),
        }
    }

    /// Connection identifier, unique per registration.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Tenant scope this subscriber receives events for.
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// User behind the connection.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// When the connection was registered.
    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Last moment an event was enqueued for or delivered to this
    /// subscriber.
    pub fn last_activity(&self) -> Timestamp {
        *self
            .last_activity
            .lock()
            .expect("Subscriber: last_activity lock poisoned")
    }

    /// Enqueues one event, refreshing the activity clock.
    pub(crate) fn enqueue(&self, event: EventEnvelope) -> PushOutcome {
        self.touch();
        self.queue.push(event)
    }

    /// Waits for the next event for this subscriber.
    ///
    /// Returns `None` once the subscriber has been unregistered and its
    /// queue drained.
    pub async fn next_event(&self) -> Option<EventEnvelope> {
        let event = self.queue.recv().await;
        if event.is_some() {
            self.touch();
        }
        event
    }

    /// Number of undelivered events.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn close(&self) {
        self.queue.close();
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .expect("Subscriber: last_activity lock poisoned") = Timestamp::now();
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// tenant -> connection -> subscriber
    tenants: HashMap<TenantId, HashMap<ConnectionId, Arc<Subscriber>>>,
    /// connection -> tenant, for O(1) removal
    connections: HashMap<ConnectionId, TenantId>,
}

/// Shared, mutation-guarded subscriber table.
///
/// Uses `RwLock` since fan-out reads vastly outnumber register/unregister
/// writes.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    state: RwLock<RegistryState>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a subscriber under its tenant scope.
    ///
    /// The insertion is atomic with queue attachment (the subscriber already
    /// owns its queue), so an event published immediately afterwards cannot
    /// be lost between registration and transport-ready.
    pub fn insert(&self, subscriber: Arc<Subscriber>) {
        let mut state = self
            .state
            .write()
            .expect("SubscriberRegistry: state lock poisoned");
        state
            .connections
            .insert(subscriber.id(), subscriber.tenant().clone());
        state
            .tenants
            .entry(subscriber.tenant().clone())
            .or_default()
            .insert(subscriber.id(), subscriber);
    }

    /// Removes a subscriber; returns the removed entry, if any.
    ///
    /// Idempotent: removing an unknown connection returns `None`. Empty
    /// tenant buckets are cleaned up.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Arc<Subscriber>> {
        let mut state = self
            .state
            .write()
            .expect("SubscriberRegistry: state lock poisoned");
        let tenant = state.connections.remove(connection_id)?;

        let bucket = state.tenants.get_mut(&tenant)?;
        let removed = bucket.remove(connection_id);
        if bucket.is_empty() {
            state.tenants.remove(&tenant);
        }
        removed
    }

    /// All subscribers registered under a tenant scope.
    pub fn in_scope(&self, tenant: &TenantId) -> Vec<Arc<Subscriber>> {
        let state = self
            .state
            .read()
            .expect("SubscriberRegistry: state lock poisoned");
        state
            .tenants
            .get(tenant)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every registered subscriber, across all tenants.
    pub fn all(&self) -> Vec<Arc<Subscriber>> {
        let state = self
            .state
            .read()
            .expect("SubscriberRegistry: state lock poisoned");
        state
            .tenants
            .values()
            .flat_map(|bucket| bucket.values().cloned())
            .collect()
    }

    /// Count of subscribers in one tenant scope.
    pub fn count(&self, tenant: &TenantId) -> usize {
        let state = self
            .state
            .read()
            .expect("SubscriberRegistry: state lock poisoned");
        state.tenants.get(tenant).map_or(0, HashMap::len)
    }

    /// Total count of subscribers across all tenants.
    pub fn total(&self) -> usize {
        let state = self
            .state
            .read()
            .expect("SubscriberRegistry: state lock poisoned");
        state.connections.len()
    }

    /// Tenant scopes with at least one live subscriber.
    pub fn active_tenants(&self) -> Vec<TenantId> {
        let state = self
            .state
            .read()
            .expect("SubscriberRegistry: state lock poisoned");
        state.tenants.keys().cloned().collect()
    }
}
