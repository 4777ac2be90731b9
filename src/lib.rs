//! Paddock Realtime - synchronization layer for the Paddock equine
//! record-management platform.
//!
//! Pushes committed record mutations to live clients over Server-Sent
//! Events, scoped per tenant, and keeps client-side record caches converged
//! with the stream through optimistic reconciliation.

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
