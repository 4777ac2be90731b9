//! Client-side synchronization layer.
//!
//! `SyncClient` keeps one stream connection alive with bounded retry,
//! `EventDispatcher` routes decoded envelopes to feature handlers, and
//! `ReconciledStore` keeps a module's cached records converged with the
//! event stream.

mod connection;
mod dispatcher;
mod frames;
mod sse_connector;
mod store;

pub use connection::{ConnectionState, SyncClient};
pub use dispatcher::{EventDispatcher, Subscription};
pub use frames::SseFrameDecoder;
pub use sse_connector::SseConnector;
pub use store::ReconciledStore;
