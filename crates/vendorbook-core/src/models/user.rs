use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de_id;

/// Mirror of the server-issued user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(
        default,
        alias = "fullName",
        alias = "displayName",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, alias = "cnicNumber", skip_serializing_if = "Option::is_none")]
    pub cnic_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Fields the client does not model (role, avatar, business info...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl User {
    /// Name to greet the user with, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Partial profile edit sent to `PUT /users/profile`.
/// Unset fields are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnic_number: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.cnic_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_numeric_id() {
        let json = r#"{"id": 1, "email": "a@b.com"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.id, "1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.name, None);
        assert!(user.extra.is_empty());
    }

    #[test]
    fn test_parse_user_aliases() {
        let json = r#"{"_id": "65f1c0", "email": "v@shop.pk", "fullName": "Ushna", "cnicNumber": "35202-1234567-1", "role": "vendor"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.id, "65f1c0");
        assert_eq!(user.name.as_deref(), Some("Ushna"));
        assert_eq!(user.cnic_number.as_deref(), Some("35202-1234567-1"));
        assert_eq!(user.extra.get("role"), Some(&Value::String("vendor".into())));
    }

    #[test]
    fn test_parse_user_rejects_object_id() {
        let json = r#"{"id": {"oid": 1}, "email": "a@b.com"}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user: User = serde_json::from_str(r#"{"id": 2, "email": "x@y.com"}"#).unwrap();
        assert_eq!(user.display_name(), "x@y.com");
        user.name = Some("  ".into());
        assert_eq!(user.display_name(), "x@y.com");
        user.name = Some("Hamza".into());
        assert_eq!(user.display_name(), "Hamza");
    }

    #[test]
    fn test_profile_update_omits_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("0300-1234567".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"phone": "0300-1234567"}));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }
}
