//! Client route table, path resolution and the navigation guard.
//!
//! Routes carry [`RouteMeta`] access requirements. [`decide`] is the pure guard decision;
//! [`RouteGuard`] applies it against a live [`crate::identity::SessionStore`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::AuthEvent;

mod guard;

pub use guard::{Navigation, RouteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteName {
    Home,
    Login,
    Register,
    Dashboard,
    Categories,
    CategoryCreate,
    CategoryEdit,
    MenuItems,
    MenuItemCreate,
    MenuItemEdit,
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub title: &'static str,
    pub requires_auth: bool,
    pub guest_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDef {
    pub name: RouteName,
    /// Pattern; `:name` segments capture a parameter.
    pub path: &'static str,
    pub meta: RouteMeta,
}

const fn route(name: RouteName, path: &'static str, title: &'static str, requires_auth: bool, guest_only: bool) -> RouteDef {
    RouteDef { name, path, meta: RouteMeta { title, requires_auth, guest_only } }
}

pub static ROUTES: &[RouteDef] = &[
    route(RouteName::Home, "/", "Home", false, false),
    route(RouteName::Login, "/login", "Login", false, true),
    route(RouteName::Register, "/register", "Register", false, true),
    route(RouteName::Dashboard, "/dashboard", "Dashboard", true, false),
    route(RouteName::Categories, "/categories", "Menu Categories", true, false),
    route(RouteName::CategoryCreate, "/categories/create", "Create Category", true, false),
    route(RouteName::CategoryEdit, "/categories/:id/edit", "Edit Category", true, false),
    route(RouteName::MenuItems, "/menu-items", "Menu Items", true, false),
    route(RouteName::MenuItemCreate, "/menu-items/create", "Create Menu Item", true, false),
    route(RouteName::MenuItemEdit, "/menu-items/:id/edit", "Edit Menu Item", true, false),
];

static NOT_FOUND: RouteDef = route(RouteName::NotFound, "/:path_match*", "Page Not Found", false, false);

impl RouteName {
    pub fn def(self) -> &'static RouteDef {
        ROUTES.iter().find(|r| r.name == self).unwrap_or(&NOT_FOUND)
    }

    pub fn path(self) -> &'static str { self.def().path }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: &'static RouteDef,
    /// Normalised path without query string or fragment.
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    pub fn name(&self) -> RouteName { self.route.name }
    pub fn meta(&self) -> &RouteMeta { &self.route.meta }
    pub fn param(&self, key: &str) -> Option<&str> { self.params.get(key).map(String::as_str) }
}

fn normalise(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let p = path[..end].trim();
    let p = p.trim_end_matches('/');
    if p.is_empty() { "/".to_string() }
    else if p.starts_with('/') { p.to_string() }
    else { format!("/{}", p) }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let pat: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if pat.len() != segs.len() { return None; }
    let mut params = BTreeMap::new();
    for (p, s) in pat.iter().zip(segs.iter()) {
        match p.strip_prefix(':') {
            Some(name) => { params.insert(name.to_string(), (*s).to_string()); }
            None if p == s => {}
            None => return None,
        }
    }
    Some(params)
}

/// First matching route in table order; anything else resolves to the catch-all.
pub fn resolve(path: &str) -> ResolvedRoute {
    let path = normalise(path);
    for r in ROUTES.iter() {
        if let Some(params) = match_pattern(r.path, &path) {
            return ResolvedRoute { route: r, path, params };
        }
    }
    let mut params = BTreeMap::new();
    params.insert("path_match".to_string(), path.trim_start_matches('/').to_string());
    ResolvedRoute { route: &NOT_FOUND, path, params }
}

pub fn document_title(route: &RouteDef, app_name: &str) -> String {
    let title = if route.meta.title.is_empty() { app_name } else { route.meta.title };
    format!("{} - {}", title, app_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(RouteName),
}

/// Pure guard decision: protected routes need a session, guest-only routes refuse one.
pub fn decide(meta: &RouteMeta, authenticated: bool) -> NavigationDecision {
    if meta.requires_auth && !authenticated {
        NavigationDecision::Redirect(RouteName::Login)
    } else if meta.guest_only && authenticated {
        NavigationDecision::Redirect(RouteName::Dashboard)
    } else {
        NavigationDecision::Allow
    }
}

/// Where the presentation layer goes after a session operation completes.
pub fn landing_after(event: AuthEvent) -> RouteName {
    match event {
        AuthEvent::Registered | AuthEvent::LoggedIn => RouteName::Dashboard,
        AuthEvent::LoggedOut => RouteName::Login,
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
