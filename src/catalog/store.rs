use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::AppResult;
use crate::pagination::{PageSummary, PaginatedResponse};

use super::{CatalogService, Category, CategoryForm, MenuItem, MenuItemForm, MenuItemQuery};

/// What a list view shows: the fetched page, the entity being edited and request status.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: PageSummary,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self { items: Vec::new(), current: None, loading: false, error: None, pagination: PageSummary::default() }
    }
}

struct Tracked<T> {
    state: RwLock<ListState<T>>,
    target: &'static str,
}

/// Sets `loading` for the duration of a request and resets it on every exit path.
struct Busy<'a, T> {
    state: &'a RwLock<ListState<T>>,
}

impl<T> Drop for Busy<'_, T> {
    fn drop(&mut self) { self.state.write().loading = false; }
}

impl<T: Clone> Tracked<T> {
    fn new(target: &'static str) -> Self { Self { state: RwLock::new(ListState::default()), target } }

    fn begin(&self) -> Busy<'_, T> {
        {
            let mut s = self.state.write();
            s.loading = true;
            s.error = None;
        }
        Busy { state: &self.state }
    }

    /// Mirror the error into state and hand it back to the caller.
    fn settle<R>(&self, res: AppResult<R>) -> AppResult<R> {
        if let Err(e) = &res {
            warn!(target: "catalog", store = self.target, code = e.code_str(), error = %e.message(), "catalog request failed");
            self.state.write().error = Some(e.message().to_string());
        }
        res
    }

    fn store_page(&self, page: &PaginatedResponse<T>) {
        let mut s = self.state.write();
        s.items = page.data.clone();
        s.pagination = PageSummary::from(&page.meta);
    }

    fn snapshot(&self) -> ListState<T> { self.state.read().clone() }
    fn clear_error(&self) { self.state.write().error = None; }
}

pub struct CategoryStore {
    service: Arc<dyn CatalogService>,
    inner: Tracked<Category>,
}

impl CategoryStore {
    pub fn new(service: Arc<dyn CatalogService>) -> Self { Self { service, inner: Tracked::new("categories") } }

    pub async fn fetch_categories(&self, page: i64) -> AppResult<PaginatedResponse<Category>> {
        let _busy = self.inner.begin();
        let per_page = self.inner.state.read().pagination.per_page;
        let res = self.service.list_categories(page, per_page).await;
        if let Ok(p) = &res { self.inner.store_page(p); }
        self.inner.settle(res)
    }

    pub async fn fetch_category(&self, id: i64) -> AppResult<Category> {
        let _busy = self.inner.begin();
        let res = self.service.get_category(id).await;
        if let Ok(c) = &res { self.inner.state.write().current = Some(c.clone()); }
        self.inner.settle(res)
    }

    pub async fn create_category(&self, form: &CategoryForm) -> AppResult<Category> {
        let _busy = self.inner.begin();
        let res = self.service.create_category(form).await;
        if let Ok(c) = &res { self.inner.state.write().items.push(c.clone()); }
        self.inner.settle(res)
    }

    pub async fn update_category(&self, id: i64, form: &CategoryForm) -> AppResult<Category> {
        let _busy = self.inner.begin();
        let res = self.service.update_category(id, form).await;
        if let Ok(c) = &res {
            let mut s = self.inner.state.write();
            if let Some(slot) = s.items.iter_mut().find(|x| x.id == id) { *slot = c.clone(); }
            if s.current.as_ref().map(|x| x.id == id).unwrap_or(false) { s.current = Some(c.clone()); }
        }
        self.inner.settle(res)
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        let _busy = self.inner.begin();
        let res = self.service.delete_category(id).await;
        if res.is_ok() { self.inner.state.write().items.retain(|c| c.id != id); }
        self.inner.settle(res)
    }

    pub fn total_categories(&self) -> usize { self.inner.state.read().items.len() }
    pub fn snapshot(&self) -> ListState<Category> { self.inner.snapshot() }
    pub fn is_loading(&self) -> bool { self.inner.state.read().loading }
    pub fn error(&self) -> Option<String> { self.inner.state.read().error.clone() }
    pub fn clear_error(&self) { self.inner.clear_error() }
}

/// Items of one category, in list order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub items: Vec<MenuItem>,
}

pub struct MenuItemStore {
    service: Arc<dyn CatalogService>,
    inner: Tracked<MenuItem>,
    search: RwLock<String>,
}

impl MenuItemStore {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self { service, inner: Tracked::new("menu_items"), search: RwLock::new(String::new()) }
    }

    pub async fn fetch_menu_items(&self, page: i64, search: &str) -> AppResult<PaginatedResponse<MenuItem>> {
        let _busy = self.inner.begin();
        *self.search.write() = search.to_string();
        let per_page = self.inner.state.read().pagination.per_page;
        let query = MenuItemQuery { per_page, ..MenuItemQuery::page(page) }.with_search(search);
        let res = self.service.list_menu_items(&query).await;
        if let Ok(p) = &res { self.inner.store_page(p); }
        self.inner.settle(res)
    }

    pub async fn fetch_menu_item(&self, id: i64) -> AppResult<MenuItem> {
        let _busy = self.inner.begin();
        let res = self.service.get_menu_item(id).await;
        if let Ok(i) = &res { self.inner.state.write().current = Some(i.clone()); }
        self.inner.settle(res)
    }

    pub async fn create_menu_item(&self, form: &MenuItemForm) -> AppResult<MenuItem> {
        let _busy = self.inner.begin();
        let res = self.service.create_menu_item(form).await;
        if let Ok(i) = &res { self.inner.state.write().items.push(i.clone()); }
        self.inner.settle(res)
    }

    pub async fn update_menu_item(&self, id: i64, form: &MenuItemForm) -> AppResult<MenuItem> {
        let _busy = self.inner.begin();
        let res = self.service.update_menu_item(id, form).await;
        if let Ok(i) = &res {
            let mut s = self.inner.state.write();
            if let Some(slot) = s.items.iter_mut().find(|x| x.id == id) { *slot = i.clone(); }
        }
        self.inner.settle(res)
    }

    pub async fn delete_menu_item(&self, id: i64) -> AppResult<()> {
        let _busy = self.inner.begin();
        let res = self.service.delete_menu_item(id).await;
        if res.is_ok() { self.inner.state.write().items.retain(|i| i.id != id); }
        self.inner.settle(res)
    }

    /// Loaded items grouped by their joined category; items without one are skipped.
    pub fn grouped(&self) -> Vec<CategoryGroup> {
        let s = self.inner.state.read();
        let mut groups: BTreeMap<i64, CategoryGroup> = BTreeMap::new();
        for item in s.items.iter() {
            let Some(cat) = item.category.as_ref() else { continue; };
            groups.entry(cat.id)
                .or_insert_with(|| CategoryGroup { category: cat.clone(), items: Vec::new() })
                .items.push(item.clone());
        }
        groups.into_values().collect()
    }

    /// Loaded items narrowed by the current search text, without refetching.
    pub fn filtered(&self) -> Vec<MenuItem> {
        let q = self.search.read().trim().to_lowercase();
        let s = self.inner.state.read();
        if q.is_empty() { return s.items.clone(); }
        s.items.iter()
            .filter(|i| i.item_name.to_lowercase().contains(&q)
                || i.category.as_ref().map(|c| c.name.to_lowercase().contains(&q)).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn set_search_query(&self, query: &str) { *self.search.write() = query.to_string(); }
    pub fn search_query(&self) -> String { self.search.read().clone() }
    pub fn snapshot(&self) -> ListState<MenuItem> { self.inner.snapshot() }
    pub fn is_loading(&self) -> bool { self.inner.state.read().loading }
    pub fn error(&self) -> Option<String> { self.inner.state.read().error.clone() }
    pub fn clear_error(&self) { self.inner.clear_error() }
}
