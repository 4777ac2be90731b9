//! RealtimePublisher port - the publish boundary for mutation paths.
//!
//! Any application code that commits a domain mutation calls this port to
//! push the change to live subscribers. Implementations must never block the
//! caller: publishing is a fire-and-forget enqueue, and slow or dead
//! subscribers are the implementation's problem, not the publisher's.

use crate::domain::foundation::{EventEnvelope, TenantId};

/// Port for broadcasting committed mutations to live subscribers.
///
/// # Contract
///
/// - `publish` cannot fail and never blocks on subscriber I/O
/// - events are delivered only to subscribers registered under the same
///   tenant scope
/// - a stalled subscriber degrades only its own delivery (bounded queue,
///   oldest unsent event dropped), never the publisher or its siblings
pub trait RealtimePublisher: Send + Sync {
    /// Enqueues an event for every live subscriber in the tenant scope.
    fn publish(&self, tenant: &TenantId, event: EventEnvelope);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RealtimePublisher) {}
}
