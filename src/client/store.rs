//! Shared record store wired to the dispatcher.
//!
//! A `ReconciledStore` wraps one module's `ReconciledList` behind a lock so
//! UI code and the dispatcher's handlers can mutate the same copy. Local
//! user actions go through the `optimistic_*` methods; `attach` hooks the
//! store to a module's server events so the echoes reconcile in place.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::foundation::{ModuleAction, ValidationError};
use crate::domain::reconcile::{id_from_payload, ReconcileError, ReconciledList, Record};

use super::dispatcher::{EventDispatcher, Subscription};

/// Thread-safe reconciled record list for one module.
///
/// Cheap to clone; all clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ReconciledStore<T: Record> {
    list: Arc<Mutex<ReconciledList<T>>>,
}

impl<T: Record + Send + 'static> ReconciledStore<T> {
    pub fn new() -> Self {
        Self {
            list: Arc::new(Mutex::new(ReconciledList::new())),
        }
    }

    /// Applies a local create before the server confirms it.
    ///
    /// The later server "created" echo merges into this entry instead of
    /// duplicating it.
    pub fn optimistic_create(&self, record: T) -> Result<(), ReconcileError> {
        self.lock().upsert(record)?;
        Ok(())
    }

    /// Applies a local partial update before the server confirms it.
    pub fn optimistic_update(&self, patch: &serde_json::Value) -> Result<bool, ReconcileError> {
        self.lock().merge_patch(patch)
    }

    /// Applies a local delete before the server confirms it. Idempotent.
    pub fn optimistic_remove(&self, id: &str) -> bool {
        self.lock().remove(id)
    }

    /// Clones the current entries.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True if a record with the given id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// Wires this store to a module's server events.
    ///
    /// - `created` upserts the payload as a full record
    /// - `updated` and `completed` merge the payload as a partial patch;
    ///   a patch for an unknown id is skipped
    /// - `deleted` removes by the payload's id; absent ids are a no-op
    ///
    /// The store stays wired until the returned guard is dropped.
    pub fn attach(
        &self,
        dispatcher: &Arc<EventDispatcher>,
        module: &str,
    ) -> Result<Subscription, ValidationError> {
        let list = Arc::clone(&self.list);
        dispatcher.subscribe_module(module, move |action, envelope| {
            let mut list = list.lock().expect("ReconciledStore: list lock poisoned");
            match action {
                ModuleAction::Created => match envelope.payload_as::<T>() {
                    Ok(record) => {
                        if let Err(e) = list.upsert(record) {
                            warn!(event = %envelope.event_type, error = %e, "Failed to apply created event");
                        }
                    }
                    Err(e) => {
                        warn!(event = %envelope.event_type, error = %e, "Created payload is not a full record")
                    }
                },
                ModuleAction::Updated | ModuleAction::Completed => {
                    match list.merge_patch(&envelope.payload) {
                        Ok(true) => {}
                        Ok(false) => debug!(
                            event = %envelope.event_type,
                            "Update for unknown record id, skipped"
                        ),
                        Err(e) => warn!(
                            event = %envelope.event_type,
                            error = %e,
                            "Failed to apply updated event"
                        ),
                    }
                }
                ModuleAction::Deleted => match id_from_payload(&envelope.payload) {
                    Some(id) => {
                        list.remove(&id);
                    }
                    None => warn!(
                        event = %envelope.event_type,
                        "Deleted payload is missing an id, skipped"
                    ),
                },
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReconciledList<T>> {
        self.list.lock().expect("ReconciledStore: list lock poisoned")
    }
}
