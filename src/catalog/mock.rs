use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::pagination::{paginate_with, PageQuery, PaginatedResponse};
use crate::validation::schemas;

use super::{CatalogService, Category, CategoryForm, MenuItem, MenuItemForm, MenuItemQuery, MAX_PER_PAGE};

const BUSINESS_ID: i64 = 1;

#[derive(Debug, Default)]
struct CatalogData {
    categories: Vec<Category>,
    items: Vec<MenuItem>,
}

impl CatalogData {
    fn next_category_id(&self) -> i64 { self.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1 }
    fn next_item_id(&self) -> i64 { self.items.iter().map(|i| i.id).max().unwrap_or(0) + 1 }

    fn category(&self, id: i64) -> Option<&Category> { self.categories.iter().find(|c| c.id == id) }

    fn joined(&self, item: &MenuItem) -> MenuItem {
        let mut out = item.clone();
        out.category = self.category(item.category_id).cloned();
        out
    }
}

/// In-memory catalog with demo data. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MockCatalogService {
    data: Arc<RwLock<CatalogData>>,
    latency: Duration,
}

fn category_not_found(id: i64) -> AppError { AppError::not_found("category_not_found".to_string(), format!("Category with ID {} not found", id)) }
fn item_not_found(id: i64) -> AppError { AppError::not_found("menu_item_not_found".to_string(), format!("Menu item with ID {} not found", id)) }

fn unknown_category() -> AppError {
    let mut errors = BTreeMap::new();
    errors.insert("category_id".to_string(), "The selected category does not exist".to_string());
    AppError::validation_fields("Please check the form for errors.", errors)
}

impl MockCatalogService {
    pub fn new() -> Self { Self::default() }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Demo restaurant: four categories and a dozen items.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let cat = |id: i64, name: &str, description: &str| Category {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            image: None,
            business_id: Some(BUSINESS_ID),
            created_at: now,
            updated_at: now,
        };
        let categories = vec![
            cat(1, "Breakfast", "Served until 11am"),
            cat(2, "Main Dishes", "Traditional plates served with injera"),
            cat(3, "Drinks", "Hot and cold beverages"),
            cat(4, "Desserts", "Something sweet to finish"),
        ];
        let item = |id: i64, name: &str, category_id: i64, price: f64, discount: Option<f64>| MenuItem {
            id,
            item_name: name.to_string(),
            category_id,
            business_id: BUSINESS_ID,
            price,
            tax_percentage: 15.0,
            discount,
            photo: None,
            created_at: now,
            updated_at: now,
            category: None,
        };
        let items = vec![
            item(1, "Firfir", 1, 6.5, None),
            item(2, "Chechebsa", 1, 7.0, None),
            item(3, "Scrambled Eggs", 1, 5.99, Some(10.0)),
            item(4, "Doro Wat", 2, 14.5, None),
            item(5, "Spicy Tibs", 2, 13.0, None),
            item(6, "Shiro", 2, 9.5, Some(5.0)),
            item(7, "Kitfo", 2, 16.0, None),
            item(8, "Beyaynetu", 2, 12.0, None),
            item(9, "Macchiato", 3, 2.5, None),
            item(10, "Fresh Juice", 3, 4.0, None),
            item(11, "Spiced Tea", 3, 2.0, None),
            item(12, "Baklava", 4, 4.5, Some(20.0)),
        ];
        Self { data: Arc::new(RwLock::new(CatalogData { categories, items })), latency: Duration::ZERO }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() { tokio::time::sleep(self.latency).await; }
    }

    pub fn category_count(&self) -> usize { self.data.read().categories.len() }
    pub fn item_count(&self) -> usize { self.data.read().items.len() }
}

fn item_matches(item: &MenuItem, query: &str) -> bool {
    item.item_name.to_lowercase().contains(query)
        || item.category.as_ref().map(|c| c.name.to_lowercase().contains(query)).unwrap_or(false)
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn list_categories(&self, page: i64, per_page: usize) -> AppResult<PaginatedResponse<Category>> {
        self.delay().await;
        let data = self.data.read();
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        Ok(paginate_with(&data.categories, page, per_page, &PageQuery::new("/categories")))
    }

    async fn get_category(&self, id: i64) -> AppResult<Category> {
        self.delay().await;
        self.data.read().category(id).cloned().ok_or_else(|| category_not_found(id))
    }

    async fn create_category(&self, form: &CategoryForm) -> AppResult<Category> {
        self.delay().await;
        schemas::category().validate(form)?;
        let now = Utc::now();
        let mut data = self.data.write();
        let category = Category {
            id: data.next_category_id(),
            name: form.name.trim().to_string(),
            description: form.description.clone().filter(|d| !d.trim().is_empty()),
            image: form.image.clone(),
            business_id: Some(BUSINESS_ID),
            created_at: now,
            updated_at: now,
        };
        data.categories.push(category.clone());
        info!(target: "catalog", id = category.id, "category created");
        Ok(category)
    }

    async fn update_category(&self, id: i64, form: &CategoryForm) -> AppResult<Category> {
        self.delay().await;
        schemas::category().validate(form)?;
        let mut data = self.data.write();
        let category = data.categories.iter_mut().find(|c| c.id == id).ok_or_else(|| category_not_found(id))?;
        category.name = form.name.trim().to_string();
        category.description = form.description.clone().filter(|d| !d.trim().is_empty());
        if form.image.is_some() { category.image = form.image.clone(); }
        category.updated_at = Utc::now();
        debug!(target: "catalog", id, "category updated");
        Ok(category.clone())
    }

    /// Refuses to delete a category that still has items.
    async fn delete_category(&self, id: i64) -> AppResult<()> {
        self.delay().await;
        let mut data = self.data.write();
        if data.category(id).is_none() { return Err(category_not_found(id)); }
        let in_use = data.items.iter().filter(|i| i.category_id == id).count();
        if in_use > 0 {
            return Err(AppError::validation(
                "category_in_use".to_string(),
                format!("Category still has {} menu item(s); move or delete them first", in_use),
            ));
        }
        data.categories.retain(|c| c.id != id);
        info!(target: "catalog", id, "category deleted");
        Ok(())
    }

    async fn list_menu_items(&self, query: &MenuItemQuery) -> AppResult<PaginatedResponse<MenuItem>> {
        self.delay().await;
        let data = self.data.read();
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let needle = search.map(str::to_lowercase);
        let category_id = query.category_id.filter(|c| *c != 0);
        let filtered: Vec<MenuItem> = data.items.iter()
            .filter(|i| category_id.map(|c| i.category_id == c).unwrap_or(true))
            .map(|i| data.joined(i))
            .filter(|i| needle.as_deref().map(|q| item_matches(i, q)).unwrap_or(true))
            .collect();
        debug!(target: "catalog", matched = filtered.len(), search = ?search, category_id = ?category_id, "menu items filtered");
        let page_query = PageQuery { path: "/menu-items".to_string(), search: search.map(str::to_string), category_id };
        Ok(paginate_with(&filtered, query.page, query.per_page.clamp(1, MAX_PER_PAGE), &page_query))
    }

    async fn get_menu_item(&self, id: i64) -> AppResult<MenuItem> {
        self.delay().await;
        let data = self.data.read();
        data.items.iter().find(|i| i.id == id).map(|i| data.joined(i)).ok_or_else(|| item_not_found(id))
    }

    async fn create_menu_item(&self, form: &MenuItemForm) -> AppResult<MenuItem> {
        self.delay().await;
        schemas::menu_item().validate(form)?;
        let now = Utc::now();
        let mut data = self.data.write();
        if data.category(form.category_id).is_none() { return Err(unknown_category()); }
        let item = MenuItem {
            id: data.next_item_id(),
            item_name: form.item_name.trim().to_string(),
            category_id: form.category_id,
            business_id: BUSINESS_ID,
            price: form.price,
            tax_percentage: form.tax_percentage,
            discount: form.discount,
            photo: form.photo.clone(),
            created_at: now,
            updated_at: now,
            category: None,
        };
        data.items.push(item.clone());
        info!(target: "catalog", id = item.id, "menu item created");
        Ok(data.joined(&item))
    }

    async fn update_menu_item(&self, id: i64, form: &MenuItemForm) -> AppResult<MenuItem> {
        self.delay().await;
        schemas::menu_item().validate(form)?;
        let mut data = self.data.write();
        if data.category(form.category_id).is_none() { return Err(unknown_category()); }
        let item = data.items.iter_mut().find(|i| i.id == id).ok_or_else(|| item_not_found(id))?;
        item.item_name = form.item_name.trim().to_string();
        item.category_id = form.category_id;
        item.price = form.price;
        item.tax_percentage = form.tax_percentage;
        item.discount = form.discount;
        if form.photo.is_some() { item.photo = form.photo.clone(); }
        item.updated_at = Utc::now();
        let updated = item.clone();
        debug!(target: "catalog", id, "menu item updated");
        Ok(data.joined(&updated))
    }

    async fn delete_menu_item(&self, id: i64) -> AppResult<()> {
        self.delay().await;
        let mut data = self.data.write();
        let before = data.items.len();
        data.items.retain(|i| i.id != id);
        if data.items.len() == before { return Err(item_not_found(id)); }
        info!(target: "catalog", id, "menu item deleted");
        Ok(())
    }
}
