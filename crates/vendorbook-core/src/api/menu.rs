//! Vendor menu endpoints.

use serde_json::Value;
use urlencoding::encode as urlencode;

use super::{ApiClient, ApiError};
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem};

impl ApiClient {
    /// List menu items, optionally limited to one vendor.
    pub async fn list_menus(&self, vendor_id: Option<&str>) -> Result<Vec<MenuItem>, ApiError> {
        let path = match vendor_id {
            Some(id) => format!("/menus?vendor_id={}", urlencode(id)),
            None => "/menus".to_string(),
        };
        let value: Value = self.get(&path).await?;
        Self::unwrap_envelope(&path, value, "menus")
    }

    pub async fn menu(&self, id: &str) -> Result<MenuItem, ApiError> {
        let path = format!("/menus/{}", urlencode(id));
        let value: Value = self.get(&path).await?;
        Self::unwrap_envelope(&path, value, "menu")
    }

    pub async fn create_menu(&self, item: &NewMenuItem) -> Result<MenuItem, ApiError> {
        let value: Value = self.post("/menus", item).await?;
        Self::unwrap_envelope("/menus", value, "menu")
    }

    pub async fn update_menu(&self, id: &str, update: &MenuItemUpdate) -> Result<MenuItem, ApiError> {
        let path = format!("/menus/{}", urlencode(id));
        let value: Value = self.put(&path, update).await?;
        Self::unwrap_envelope(&path, value, "menu")
    }

    pub async fn delete_menu(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/menus/{}", urlencode(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_encoded_into_paths() {
        assert_eq!(urlencode("abc-123"), "abc-123");
        assert_eq!(urlencode("a b/c"), "a%20b%2Fc");
    }
}
