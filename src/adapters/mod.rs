//! Adapters: concrete implementations behind the ports.

pub mod auth;
pub mod hub;
pub mod sse;
