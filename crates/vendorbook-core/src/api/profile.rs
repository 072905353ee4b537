//! Profile endpoints.

use serde_json::Value;
use urlencoding::encode as urlencode;

use super::{ApiClient, ApiError};
use crate::models::{ProfileUpdate, User};

impl ApiClient {
    /// Fetch the signed-in user and refresh the session's copy of it.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let (_, issued) = self.session_state().credentials();
        let value: Value = self.get("/users/me").await?;
        let user: User = Self::unwrap_envelope("/users/me", value, "user")?;
        self.session_state().replace_user(issued, user.clone());
        Ok(user)
    }

    /// Fetch every vendor profile visible to the signed-in user.
    pub async fn all_profiles(&self) -> Result<Vec<User>, ApiError> {
        let value: Value = self.get("/profile").await?;
        Self::unwrap_envelope("/profile", value, "profiles")
    }

    pub async fn profile_by_id(&self, id: &str) -> Result<User, ApiError> {
        let path = format!("/profile/{}", urlencode(id));
        let value: Value = self.get(&path).await?;
        Self::unwrap_envelope(&path, value, "profile")
    }

    /// Apply a partial profile edit. The updated user replaces the session's copy.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        if update.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }
        let (_, issued) = self.session_state().credentials();
        let value: Value = self.put("/users/profile", update).await?;
        let user: User = Self::unwrap_envelope("/users/profile", value, "user")?;
        self.session_state().replace_user(issued, user.clone());
        Ok(user)
    }
}
