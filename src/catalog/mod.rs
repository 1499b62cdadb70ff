//! Menu categories and menu items.
//!
//! [`CatalogService`] is the resource seam: [`MockCatalogService`] serves in-memory demo
//! data and [`crate::api::RestCatalogService`] talks to the REST backend. The stores hold
//! what a list view shows between fetches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::pagination::PaginatedResponse;

mod mock;
mod store;

pub use mock::MockCatalogService;
pub use store::{CategoryGroup, CategoryStore, ListState, MenuItemStore};

/// Upper bound the services accept for `per_page`.
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URL; uploads are not handled here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub item_name: String,
    pub category_id: i64,
    pub business_id: i64,
    pub price: f64,
    pub tax_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Joined category, present in list and detail responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl MenuItem {
    /// Price after discount, before tax.
    pub fn net_price(&self) -> f64 {
        let d = self.discount.unwrap_or(0.0).clamp(0.0, 100.0);
        self.price * (1.0 - d / 100.0)
    }

    /// Price after discount with tax applied.
    pub fn gross_price(&self) -> f64 { self.net_price() * (1.0 + self.tax_percentage / 100.0) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemForm {
    pub item_name: String,
    pub category_id: i64,
    pub price: f64,
    pub tax_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemQuery {
    pub page: i64,
    pub per_page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl Default for MenuItemQuery {
    fn default() -> Self { Self { page: 1, per_page: 10, search: None, category_id: None } }
}

impl MenuItemQuery {
    pub fn page(page: i64) -> Self { Self { page, ..Self::default() } }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let s = search.into();
        self.search = if s.trim().is_empty() { None } else { Some(s.trim().to_string()) };
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_categories(&self, page: i64, per_page: usize) -> AppResult<PaginatedResponse<Category>>;
    async fn get_category(&self, id: i64) -> AppResult<Category>;
    async fn create_category(&self, form: &CategoryForm) -> AppResult<Category>;
    async fn update_category(&self, id: i64, form: &CategoryForm) -> AppResult<Category>;
    async fn delete_category(&self, id: i64) -> AppResult<()>;

    async fn list_menu_items(&self, query: &MenuItemQuery) -> AppResult<PaginatedResponse<MenuItem>>;
    async fn get_menu_item(&self, id: i64) -> AppResult<MenuItem>;
    async fn create_menu_item(&self, form: &MenuItemForm) -> AppResult<MenuItem>;
    async fn update_menu_item(&self, id: i64, form: &MenuItemForm) -> AppResult<MenuItem>;
    async fn delete_menu_item(&self, id: i64) -> AppResult<()>;
}
