//! In-process broadcast hub: tenant-scoped fan-out with bounded
//! per-subscriber queues.

mod broadcast;
mod queue;
mod registry;

pub use broadcast::BroadcastHub;
pub use queue::{OutboundQueue, PushOutcome};
pub use registry::{Subscriber, SubscriberRegistry};
