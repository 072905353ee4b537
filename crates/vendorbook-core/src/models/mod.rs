//! Data models for the marketplace backend.
//!
//! - `User`, `ProfileUpdate`: account records and partial profile edits
//! - `MenuItem`, `MenuItemForm`, `NewMenuItem`, `MenuItemUpdate`: vendor menu entries
//!
//! The backend is inconsistent about field names and id types, so the
//! deserializers here accept the known aliases and normalize ids to strings.

pub mod menu;
pub mod user;

pub use menu::{MenuCategory, MenuItem, MenuItemForm, MenuItemStatus, MenuItemUpdate, NewMenuItem};
pub use user::{ProfileUpdate, User};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept an id sent as either a JSON string or a JSON number.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Optional variant of [`de_id`]; `null` maps to `None`.
pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
