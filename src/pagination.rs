//! Page slicing with Laravel-style pagination metadata.
//!
//! `last_page = max(1, ceil(total / per_page))`, the requested page is clamped into
//! `[1, last_page]` and the slice is `[from, to)` with `to <= total`. An empty collection
//! yields page 1 of 1 with an empty slice.

use serde::{Deserialize, Serialize};

/// Pages shown on each side of the current page in [`PageMeta::links`].
const WINDOW: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: Option<String>,
    pub last: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// One entry of the numbered link strip. Ellipsis and current-page entries have no url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: usize,
    /// 1-indexed position of the first item on the page, 0 when the page is empty.
    pub from: usize,
    pub last_page: usize,
    pub links: Vec<PageLink>,
    pub path: String,
    pub per_page: usize,
    pub to: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

/// The pagination fields list views keep around between fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Default for PageSummary {
    fn default() -> Self { Self { current_page: 1, last_page: 1, per_page: 10, total: 0 } }
}

impl From<&PageMeta> for PageSummary {
    fn from(m: &PageMeta) -> Self {
        Self { current_page: m.current_page, last_page: m.last_page, per_page: m.per_page, total: m.total }
    }
}

/// Where the page links point and which filters they carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub path: String,
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

impl PageQuery {
    pub fn new(path: impl Into<String>) -> Self { Self { path: path.into(), ..Self::default() } }

    /// `&search=..&category_id=..` suffix, empty when no filter is set.
    fn suffix(&self) -> String {
        let mut out = String::new();
        if let Some(s) = self.search.as_deref().filter(|s| !s.is_empty()) {
            out.push_str("&search=");
            out.push_str(&urlencoding::encode(s));
        }
        if let Some(c) = self.category_id.filter(|c| *c != 0) {
            out.push_str(&format!("&category_id={}", c));
        }
        out
    }
}

/// Clamped page position; all indices are in bounds for a collection of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
    /// 0-based start index.
    pub start: usize,
    /// Exclusive end index.
    pub end: usize,
}

impl PageWindow {
    /// A `per_page` of 0 is treated as 1.
    pub fn compute(total: usize, page: i64, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let current_page = (page.max(1) as u64).min(last_page as u64) as usize;
        let start = ((current_page - 1) * per_page).min(total);
        let end = (start + per_page).min(total);
        Self { current_page, last_page, per_page, total, start, end }
    }

    pub fn display_from(&self) -> usize { if self.total == 0 { 0 } else { self.start + 1 } }
}

pub fn paginate<T: Clone>(items: &[T], page: i64, per_page: usize) -> PaginatedResponse<T> {
    paginate_with(items, page, per_page, &PageQuery::default())
}

pub fn paginate_with<T: Clone>(items: &[T], page: i64, per_page: usize, query: &PageQuery) -> PaginatedResponse<T> {
    let w = PageWindow::compute(items.len(), page, per_page);
    let suffix = query.suffix();
    let url = |p: usize| format!("{}?page={}{}", query.path, p, suffix);
    let (cur, last) = (w.current_page, w.last_page);

    let links = PageLinks {
        first: (cur > 1).then(|| url(1)),
        last: (cur < last).then(|| url(last)),
        prev: (cur > 1).then(|| url(cur - 1)),
        next: (cur < last).then(|| url(cur + 1)),
    };

    PaginatedResponse {
        data: items[w.start..w.end].to_vec(),
        links,
        meta: PageMeta {
            current_page: cur,
            from: w.display_from(),
            last_page: last,
            links: link_strip(cur, last, &url),
            path: query.path.clone(),
            per_page: w.per_page,
            to: w.end,
            total: w.total,
        },
    }
}

fn ellipsis() -> PageLink { PageLink { url: None, label: "...".to_string(), active: false } }

/// Numbered links: a window around the current page, with the first and last page
/// pinned and elided gaps.
fn link_strip(cur: usize, last: usize, url: &dyn Fn(usize) -> String) -> Vec<PageLink> {
    let mut links = Vec::new();
    if cur > WINDOW + 1 {
        links.push(PageLink { url: Some(url(1)), label: "1".to_string(), active: false });
        if cur > WINDOW + 2 { links.push(ellipsis()); }
    }
    let start = cur.saturating_sub(WINDOW).max(1);
    let end = (cur + WINDOW).min(last);
    for i in start..=end {
        let active = i == cur;
        links.push(PageLink { url: (!active).then(|| url(i)), label: i.to_string(), active });
    }
    if cur + WINDOW < last {
        if cur + WINDOW + 1 < last { links.push(ellipsis()); }
        links.push(PageLink { url: Some(url(last)), label: last.to_string(), active: false });
    }
    links
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
