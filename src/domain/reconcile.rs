//! Optimistic reconciliation for locally-cached record lists.
//!
//! A `ReconciledList` holds the UI-visible copy of one module's records. It
//! is mutated immediately on local user action (optimistic update) and again
//! when the corresponding server event arrives. All operations are
//! idempotent with respect to replays, so an optimistic change and its
//! server echo converge without duplicates or phantom deletes:
//!
//! - a "created" record whose id is already present merges instead of
//!   appending
//! - an "updated" patch merges fields into the existing entry in place,
//!   without reordering
//! - a "deleted" id that is already absent is a no-op

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors that can occur while applying a record or patch to a list.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The patch carries no usable `id` field.
    #[error("Record patch is missing an 'id' field")]
    MissingId,

    /// A record failed to (de)serialize during a field merge.
    #[error("Record merge failed: {0}")]
    Merge(#[from] serde_json::Error),
}

/// A domain record that can live in a reconciled list.
///
/// Records must round-trip through JSON because partial updates are applied
/// as shallow field merges on the serialized form.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Stable unique identifier for this record.
    ///
    /// Numeric ids are compared by their decimal string form, matching
    /// [`id_from_payload`].
    fn record_id(&self) -> String;
}

/// Extracts the `id` field from an event payload.
///
/// Accepts string and integer ids; both compare by decimal string form.
pub fn id_from_payload(payload: &JsonValue) -> Option<String> {
    match payload.get("id")? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ordered list of records, unique by id.
///
/// Insertion order of created records is append order; merges never reorder.
#[derive(Debug, Clone, Default)]
pub struct ReconciledList<T: Record> {
    entries: Vec<T>,
}

impl<T: Record> ReconciledList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of records in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the list holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the record with the given id, if present.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|r| r.record_id() == id)
    }

    /// True if a record with the given id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates records in list order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Clones the current entries (for handing to UI code).
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.clone()
    }

    /// Applies a full record: appends if the id is new, merges in place if
    /// it already exists.
    ///
    /// The merge-on-existing behavior is what makes an optimistic add
    /// converge with its server "created" echo instead of duplicating.
    /// Returns `true` if the record was appended.
    pub fn upsert(&mut self, record: T) -> Result<bool, ReconcileError> {
        let id = record.record_id();
        match self.position(&id) {
            Some(pos) => {
                let patch = serde_json::to_value(&record)?;
                self.entries[pos] = merge_fields(&self.entries[pos], &patch)?;
                Ok(false)
            }
            None => {
                self.entries.push(record);
                Ok(true)
            }
        }
    }

    /// Merges a partial patch into the entry named by the patch's `id`.
    ///
    /// Returns `Ok(false)` if no entry with that id exists; a partial patch
    /// cannot materialize a record, so the patch is skipped.
    pub fn merge_patch(&mut self, patch: &JsonValue) -> Result<bool, ReconcileError> {
        let id = id_from_payload(patch).ok_or(ReconcileError::MissingId)?;
        match self.position(&id) {
            Some(pos) => {
                self.entries[pos] = merge_fields(&self.entries[pos], patch)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the record with the given id.
    ///
    /// Idempotent: removing an absent id leaves the list unchanged and
    /// returns `false`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.record_id() != id);
        self.entries.len() != before
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|r| r.record_id() == id)
    }
}

/// Shallow-merges the fields of `patch` into the serialized form of
/// `existing` and deserializes the result back.
fn merge_fields<T: Record>(existing: &T, patch: &JsonValue) -> Result<T, ReconcileError> {
    let mut base = serde_json::to_value(existing)?;
    if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(base)?)
}
