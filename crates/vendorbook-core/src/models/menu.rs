use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{de_id, de_opt_id};
use crate::api::ApiError;

/// Image used when a vendor saves an item without picking one.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/200";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    Appetizers,
    Main,
    Desserts,
    Drinks,
}

impl MenuCategory {
    pub const ALL: [MenuCategory; 4] = [
        MenuCategory::Appetizers,
        MenuCategory::Main,
        MenuCategory::Desserts,
        MenuCategory::Drinks,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MenuCategory::Appetizers => "Appetizers",
            MenuCategory::Main => "Main",
            MenuCategory::Desserts => "Desserts",
            MenuCategory::Drinks => "Drinks",
        }
    }
}

impl FromStr for MenuCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "appetizers" => Ok(MenuCategory::Appetizers),
            "main" => Ok(MenuCategory::Main),
            "desserts" => Ok(MenuCategory::Desserts),
            "drinks" => Ok(MenuCategory::Drinks),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemStatus {
    #[default]
    Active,
    Inactive,
}

impl MenuItemStatus {
    pub fn toggled(self) -> Self {
        match self {
            MenuItemStatus::Active => MenuItemStatus::Inactive,
            MenuItemStatus::Inactive => MenuItemStatus::Active,
        }
    }
}

/// A menu entry as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(alias = "_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, alias = "vendorId", deserialize_with = "de_opt_id")]
    pub vendor_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: MenuCategory,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: MenuItemStatus,
}

impl MenuItem {
    /// Update that flips the item between visible and hidden.
    pub fn toggle_visibility(&self) -> MenuItemUpdate {
        MenuItemUpdate {
            status: Some(self.status.toggled()),
            ..Default::default()
        }
    }

    pub fn price_display(&self) -> String {
        format!("${:.2}", self.price)
    }
}

/// Raw vendor input from the add/edit form, before validation.
#[derive(Debug, Clone, Default)]
pub struct MenuItemForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image: Option<String>,
}

impl MenuItemForm {
    /// Check the form locally and produce the request body.
    pub fn validate(&self) -> Result<NewMenuItem, ApiError> {
        let name = self.name.trim();
        if name.is_empty() || self.price.trim().is_empty() || self.category.trim().is_empty() {
            return Err(ApiError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let category: MenuCategory = self.category.parse().map_err(|_| {
            ApiError::Validation(
                "Please select a valid category: Appetizers, Main, Desserts, or Drinks".to_string(),
            )
        })?;

        let price = match self.price.trim().parse::<f64>() {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            _ => {
                return Err(ApiError::Validation(
                    "Please enter a valid price".to_string(),
                ))
            }
        };

        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE_URL)
            .to_string();

        Ok(NewMenuItem {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            category,
            image,
            status: MenuItemStatus::Active,
        })
    }
}

/// Validated body for `POST /menus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: MenuCategory,
    pub image: String,
    pub status: MenuItemStatus,
}

/// Partial body for `PUT /menus/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MenuCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MenuItemStatus>,
}
