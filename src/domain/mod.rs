//! Domain layer: pure types and logic with no transport concerns.

pub mod foundation;
pub mod reconcile;
