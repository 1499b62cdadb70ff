use async_trait::async_trait;

use crate::catalog::{CatalogService, Category, CategoryForm, MenuItem, MenuItemForm, MenuItemQuery};
use crate::error::AppResult;
use crate::pagination::PaginatedResponse;

use super::ApiClient;

const CATEGORIES: &str = "/menu-managers";
const MENU_ITEMS: &str = "/menu-items";

/// Catalog backed by the REST API; categories live under `/menu-managers`.
#[derive(Clone)]
pub struct RestCatalogService {
    api: ApiClient,
}

impl RestCatalogService {
    pub fn new(api: ApiClient) -> Self { Self { api } }
}

fn menu_item_params(q: &MenuItemQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", q.page.max(1).to_string()), ("per_page", q.per_page.to_string())];
    if let Some(s) = q.search.as_deref().filter(|s| !s.is_empty()) { params.push(("search", s.to_string())); }
    if let Some(c) = q.category_id.filter(|c| *c != 0) { params.push(("category_id", c.to_string())); }
    params
}

#[async_trait]
impl CatalogService for RestCatalogService {
    async fn list_categories(&self, page: i64, per_page: usize) -> AppResult<PaginatedResponse<Category>> {
        let params = [("page", page.max(1).to_string()), ("per_page", per_page.to_string())];
        self.api.get_query(CATEGORIES, &params).await
    }

    async fn get_category(&self, id: i64) -> AppResult<Category> {
        self.api.get(&format!("{}/{}", CATEGORIES, id)).await
    }

    async fn create_category(&self, form: &CategoryForm) -> AppResult<Category> {
        self.api.post(CATEGORIES, form).await
    }

    async fn update_category(&self, id: i64, form: &CategoryForm) -> AppResult<Category> {
        self.api.put(&format!("{}/{}", CATEGORIES, id), form).await
    }

    async fn delete_category(&self, id: i64) -> AppResult<()> {
        self.api.delete(&format!("{}/{}", CATEGORIES, id)).await
    }

    async fn list_menu_items(&self, query: &MenuItemQuery) -> AppResult<PaginatedResponse<MenuItem>> {
        self.api.get_query(MENU_ITEMS, &menu_item_params(query)).await
    }

    async fn get_menu_item(&self, id: i64) -> AppResult<MenuItem> {
        self.api.get(&format!("{}/{}", MENU_ITEMS, id)).await
    }

    async fn create_menu_item(&self, form: &MenuItemForm) -> AppResult<MenuItem> {
        self.api.post(MENU_ITEMS, form).await
    }

    async fn update_menu_item(&self, id: i64, form: &MenuItemForm) -> AppResult<MenuItem> {
        self.api.put(&format!("{}/{}", MENU_ITEMS, id), form).await
    }

    async fn delete_menu_item(&self, id: i64) -> AppResult<()> {
        self.api.delete(&format!("{}/{}", MENU_ITEMS, id)).await
    }
}
