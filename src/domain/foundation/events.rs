//! Event types for the real-time broadcast layer.
//!
//! - `ModuleAction` - the standard CRUD-style actions a module emits
//! - `EventName` - validated `"<module>:<action>"` event name
//! - `EventEnvelope` - wire-level unit: name + opaque payload + timestamp
//! - `catalogue` - the named event types feature code subscribes to
//!
//! The hub treats event names as opaque strings: publishing a name that is
//! not in the catalogue is allowed, so new modules do not require a hub-side
//! change. The catalogue exists for feature code and for the client's
//! module-scoped subscription helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use super::{Timestamp, ValidationError};

/// Separator between module and action in an event name.
const NAME_SEPARATOR: char = ':';

/// The standard actions a module broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleAction {
    Created,
    Updated,
    Deleted,
    Completed,
}

impl ModuleAction {
    /// All standard actions, in the order the client subscribes to them.
    pub const ALL: [ModuleAction; 4] = [
        ModuleAction::Created,
        ModuleAction::Updated,
        ModuleAction::Deleted,
        ModuleAction::Completed,
    ];

    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleAction::Created => "created",
            ModuleAction::Updated => "updated",
            ModuleAction::Deleted => "deleted",
            ModuleAction::Completed => "completed",
        }
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModuleAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ModuleAction::Created),
            "updated" => Ok(ModuleAction::Updated),
            "deleted" => Ok(ModuleAction::Deleted),
            "completed" => Ok(ModuleAction::Completed),
            other => Err(ValidationError::invalid_format(
                "action",
                format!("unknown action '{}'", other),
            )),
        }
    }
}

/// Validated event name.
///
/// Most names follow the `"<module>:<action>"` convention, but bespoke names
/// without a separator (e.g. `"connected"`) are also valid. The only
/// invariant is that a name is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    /// Creates an event name, rejecting empty values.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("event_type"));
        }
        Ok(Self(name))
    }

    /// Builds the conventional `"<module>:<action>"` name.
    pub fn from_parts(module: &str, action: ModuleAction) -> Result<Self, ValidationError> {
        if module.trim().is_empty() {
            return Err(ValidationError::empty_field("module"));
        }
        Ok(Self(format!("{}{}{}", module, NAME_SEPARATOR, action)))
    }

    /// The handshake event sent immediately after registration.
    pub fn connected() -> Self {
        Self(catalogue::CONNECTED.to_string())
    }

    /// Returns the full name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the module part of a `"<module>:<action>"` name.
    ///
    /// `None` for bespoke names without a separator.
    pub fn module(&self) -> Option<&str> {
        self.0.split_once(NAME_SEPARATOR).map(|(module, _)| module)
    }

    /// Returns the action part, if it is one of the standard actions.
    pub fn action(&self) -> Option<ModuleAction> {
        self.0
            .split_once(NAME_SEPARATOR)
            .and_then(|(_, action)| action.parse().ok())
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EventName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for EventName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        name.0
    }
}

/// Wire-level unit of data pushed over a stream.
///
/// The payload is opaque to the hub: it is carried as JSON and never
/// inspected server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name used for routing (e.g. "horses:created").
    pub event_type: EventName,

    /// Event-specific payload as JSON. Opaque to the hub.
    pub payload: JsonValue,

    /// When the event was generated.
    pub emitted_at: Timestamp,
}

impl EventEnvelope {
    /// Creates an envelope stamped with the current time.
    pub fn new(event_type: EventName, payload: JsonValue) -> Self {
        Self {
            event_type,
            payload,
            emitted_at: Timestamp::now(),
        }
    }

    /// Deserializes the payload into a concrete record type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
impl EventEnvelope {
    /// Creates a test fixture envelope.
    pub fn test_fixture(event_type: &str) -> Self {
        Self::new(
            EventName::new(event_type).unwrap(),
            serde_json::json!({"id": "1"}),
        )
    }
}

/// The named event types the application emits.
///
/// Advisory for feature code; the hub itself passes any valid name through.
pub mod catalogue {
    /// Handshake event sent once per connection, right after registration.
    pub const CONNECTED: &str = "connected";

    pub const HORSES_CREATED: &str = "horses:created";
    pub const HORSES_UPDATED: &str = "horses:updated";
    pub const HORSES_DELETED: &str = "horses:deleted";

    pub const DOCUMENTS_CREATED: &str = "documents:created";
    pub const DOCUMENTS_UPDATED: &str = "documents:updated";
    pub const DOCUMENTS_DELETED: &str = "documents:deleted";

    pub const TASKS_CREATED: &str = "tasks:created";
    pub const TASKS_UPDATED: &str = "tasks:updated";
    pub const TASKS_DELETED: &str = "tasks:deleted";
    pub const TASKS_COMPLETED: &str = "tasks:completed";

    pub const HEALTH_CREATED: &str = "health:created";
    pub const HEALTH_UPDATED: &str = "health:updated";
    pub const HEALTH_DELETED: &str = "health:deleted";
    pub const HEALTH_COMPLETED: &str = "health:completed";

    pub const BREEDING_CREATED: &str = "breeding:created";
    pub const BREEDING_UPDATED: &str = "breeding:updated";
    pub const BREEDING_DELETED: &str = "breeding:deleted";

    pub const FOAL_CREATED: &str = "foal:created";
    pub const FOAL_UPDATED: &str = "foal:updated";

    pub const FINANCE_CREATED: &str = "finance:created";
    pub const FINANCE_UPDATED: &str = "finance:updated";
    pub const FINANCE_DELETED: &str = "finance:deleted";

    pub const SALES_CREATED: &str = "sales:created";
    pub const SALES_UPDATED: &str = "sales:updated";

    pub const NUTRITION_CREATED: &str = "nutrition:created";
    pub const NUTRITION_UPDATED: &str = "nutrition:updated";

    pub const TEAM_CREATED: &str = "team:created";
    pub const TEAM_UPDATED: &str = "team:updated";
    pub const TEAM_DELETED: &str = "team:deleted";

    pub const REPORTS_CREATED: &str = "reports:created";

    pub const FILES_CREATED: &str = "files:created";
    pub const FILES_DELETED: &str = "files:deleted";

    /// Every named event type, including the handshake event.
    pub const ALL: &[&str] = &[
        CONNECTED,
        HORSES_CREATED,
        HORSES_UPDATED,
        HORSES_DELETED,
        DOCUMENTS_CREATED,
        DOCUMENTS_UPDATED,
        DOCUMENTS_DELETED,
        TASKS_CREATED,
        TASKS_UPDATED,
        TASKS_DELETED,
        TASKS_COMPLETED,
        HEALTH_CREATED,
        HEALTH_UPDATED,
        HEALTH_DELETED,
        HEALTH_COMPLETED,
        BREEDING_CREATED,
        BREEDING_UPDATED,
        BREEDING_DELETED,
        FOAL_CREATED,
        FOAL_UPDATED,
        FINANCE_CREATED,
        FINANCE_UPDATED,
        FINANCE_DELETED,
        SALES_CREATED,
        SALES_UPDATED,
        NUTRITION_CREATED,
        NUTRITION_UPDATED,
        TEAM_CREATED,
        TEAM_UPDATED,
        TEAM_DELETED,
        REPORTS_CREATED,
        FILES_CREATED,
        FILES_DELETED,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_name_rejects_empty() {
        assert!(EventName::new("").is_err());
        assert!(EventName::new("  ").is_err());
    }

    #[test]
    fn event_name_splits_module_and_action() {
        let name = EventName::new("horses:created").unwrap();
        assert_eq!(name.module(), Some("horses"));
        assert_eq!(name.action(), Some(ModuleAction::Created));
    }

    #[test]
    fn bespoke_name_has_no_module_or_action() {
        let name = EventName::connected();
        assert_eq!(name.as_str(), "connected");
        assert_eq!(name.module(), None);
        assert_eq!(name.action(), None);
    }

    #[test]
    fn nonstandard_action_is_none() {
        let name = EventName::new("horses:archived").unwrap();
        assert_eq!(name.module(), Some("horses"));
        assert_eq!(name.action(), None);
    }

    #[test]
    fn from_parts_builds_conventional_name() {
        let name = EventName::from_parts("tasks", ModuleAction::Completed).unwrap();
        assert_eq!(name.as_str(), "tasks:completed");
    }

    #[test]
    fn from_parts_rejects_empty_module() {
        assert!(EventName::from_parts("", ModuleAction::Created).is_err());
    }

    #[test]
    fn event_name_deserialization_rejects_empty() {
        let result: Result<EventName, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn event_name_serializes_as_plain_string() {
        let name = EventName::new("horses:updated").unwrap();
        assert_eq!(
            serde_json::to_string(&name).unwrap(),
            r#""horses:updated""#
        );
    }

    #[test]
    fn module_action_round_trips_through_str() {
        for action in ModuleAction::ALL {
            let parsed: ModuleAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn module_action_rejects_unknown() {
        let result: Result<ModuleAction, _> = "archived".parse();
        assert!(result.is_err());
    }

    #[test]
    fn envelope_new_stamps_current_time() {
        let before = Timestamp::now();
        let envelope = EventEnvelope::new(
            EventName::new("horses:created").unwrap(),
            json!({"id": 7}),
        );

        assert!(!envelope.emitted_at.is_before(&before));
        assert_eq!(envelope.event_type.as_str(), "horses:created");
        assert_eq!(envelope.payload["id"], 7);
    }

    #[test]
    fn envelope_payload_as_deserializes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Horse {
            id: i64,
            name: String,
        }

        let envelope = EventEnvelope::new(
            EventName::new("horses:created").unwrap(),
            json!({"id": 7, "name": "Artax"}),
        );

        let horse: Horse = envelope.payload_as().unwrap();
        assert_eq!(horse.id, 7);
        assert_eq!(horse.name, "Artax");
    }

    #[test]
    fn envelope_serialization_round_trips() {
        let envelope = EventEnvelope::new(
            EventName::new("documents:deleted").unwrap(),
            json!({"id": "doc-3"}),
        );

        let json = serde_json::to_string(&envelope).unwrap();
        let restored: EventEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.event_type, envelope.event_type);
        assert_eq!(restored.payload, envelope.payload);
        assert_eq!(restored.emitted_at, envelope.emitted_at);
    }

    #[test]
    fn catalogue_names_are_all_valid() {
        for name in catalogue::ALL {
            assert!(EventName::new(*name).is_ok(), "invalid name: {}", name);
        }
    }

    #[test]
    fn catalogue_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for name in catalogue::ALL {
            assert!(seen.insert(*name), "duplicate name: {}", name);
        }
    }
}
