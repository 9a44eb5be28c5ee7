//! Actions - the only input that moves state forward
//!
//! An [`Action`] is an immutable event value: a mandatory string `type`
//! discriminator plus an arbitrary JSON object payload. Actions built in Rust
//! always carry a valid type; actions arriving as raw JSON go through
//! [`Action::try_from`], which rejects anything whose `type` is not a string.
//!
//! # Example
//!
//! ```
//! use flux_core::action::Action;
//! use serde_json::json;
//!
//! let action = Action::new("ADD_TODO").with("text", "write docs");
//! assert_eq!(action.action_type(), "ADD_TODO");
//! assert_eq!(action.get("text"), Some(&json!("write docs")));
//!
//! let raw = Action::try_from(json!({ "type": 123 }));
//! assert!(raw.is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Type of the reserved action dispatched after every store registration.
///
/// Every store sees this action once per `receive_stores` call and uses it to
/// produce its initial slice.
pub const BOOTSTRAP_STORE: &str = "BOOTSTRAP_STORE";

/// Field name of the action discriminator in the JSON representation
const TYPE_FIELD: &str = "type";

/// Errors raised while building an [`Action`] from untyped input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The `type` field is missing or holds something other than a string
    #[error("Action type must be a string (found {found})")]
    InvalidType {
        /// JSON kind found where the string was expected
        found: &'static str,
    },
}

/// An immutable event with a string `type` and a JSON payload
///
/// Serializes to (and deserializes from) a flat JSON object such as
/// `{"type": "ADD_TODO", "text": "write docs"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Action {
    action_type: String,
    payload: Map<String, Value>,
}

impl Action {
    /// Create an action with the given type and an empty payload
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Map::new(),
        }
    }

    /// The reserved bootstrap action
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::new(BOOTSTRAP_STORE)
    }

    /// Add a payload field, consuming the action
    ///
    /// A `type` field is ignored: the discriminator is fixed at construction.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != TYPE_FIELD {
            self.payload.insert(key, value.into());
        }
        self
    }

    /// The action's type discriminator
    #[must_use]
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Look up a payload field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// All payload fields (the `type` field is not included)
    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Whether this is the reserved [`BOOTSTRAP_STORE`] action
    #[must_use]
    pub fn is_bootstrap(&self) -> bool {
        self.action_type == BOOTSTRAP_STORE
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action_type)
    }
}

impl From<&str> for Action {
    fn from(action_type: &str) -> Self {
        Self::new(action_type)
    }
}

impl From<String> for Action {
    fn from(action_type: String) -> Self {
        Self::new(action_type)
    }
}

impl TryFrom<Value> for Action {
    type Error = ActionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut payload) = value else {
            return Err(ActionError::InvalidType {
                found: "missing",
            });
        };

        match payload.remove(TYPE_FIELD) {
            Some(Value::String(action_type)) => Ok(Self {
                action_type,
                payload,
            }),
            Some(other) => Err(ActionError::InvalidType {
                found: json_kind(&other),
            }),
            None => Err(ActionError::InvalidType { found: "missing" }),
        }
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        let mut object = action.payload;
        object.insert(TYPE_FIELD.to_string(), Value::String(action.action_type));
        Self::Object(object)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_type_and_payload() {
        let action = Action::new("RENAME").with("name", "Alice").with("id", 7);

        assert_eq!(action.action_type(), "RENAME");
        assert_eq!(action.get("name"), Some(&json!("Alice")));
        assert_eq!(action.get("id"), Some(&json!(7)));
        assert_eq!(action.payload().len(), 2);
    }

    #[test]
    fn test_builder_ignores_type_field() {
        let action = Action::new("RENAME").with("type", "OTHER");

        assert_eq!(action.action_type(), "RENAME");
        assert!(action.get("type").is_none());
    }

    #[test]
    fn test_try_from_rejects_non_string_type() {
        let err = Action::try_from(json!({ "type": 123 })).unwrap_err();
        assert_eq!(err, ActionError::InvalidType { found: "number" });
        assert_eq!(err.to_string(), "Action type must be a string (found number)");
    }

    #[test]
    fn test_try_from_rejects_missing_type() {
        assert_eq!(
            Action::try_from(json!({ "text": "hi" })),
            Err(ActionError::InvalidType { found: "missing" })
        );
        assert_eq!(
            Action::try_from(json!("ADD_TODO")),
            Err(ActionError::InvalidType { found: "missing" })
        );
    }

    #[test]
    fn test_deserialize_flat_object() {
        let action: Action =
            serde_json::from_str(r#"{"type":"ADD_TODO","text":"write docs"}"#).unwrap();

        assert_eq!(action, Action::new("ADD_TODO").with("text", "write docs"));
    }

    #[test]
    fn test_deserialize_rejects_bad_type() {
        let result = serde_json::from_str::<Action>(r#"{"type":false}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_includes_type() {
        let value = serde_json::to_value(Action::new("INCREMENT").with("by", 2)).unwrap();
        assert_eq!(value, json!({ "type": "INCREMENT", "by": 2 }));
    }

    #[test]
    fn test_bootstrap_is_reserved_type() {
        assert!(Action::bootstrap().is_bootstrap());
        assert!(!Action::from("INCREMENT").is_bootstrap());
    }
}
