use super::*;

#[test]
fn resolves_static_and_parameterised_paths() {
    assert_eq!(resolve("/").name(), RouteName::Home);
    assert_eq!(resolve("").name(), RouteName::Home);
    assert_eq!(resolve("/login?redirect=/dashboard").name(), RouteName::Login);
    assert_eq!(resolve("/categories/").name(), RouteName::Categories);
    assert_eq!(resolve("/categories/create").name(), RouteName::CategoryCreate);

    let edit = resolve("/menu-items/17/edit#photo");
    assert_eq!(edit.name(), RouteName::MenuItemEdit);
    assert_eq!(edit.param("id"), Some("17"));
    assert_eq!(edit.path, "/menu-items/17/edit");
}

#[test]
fn unknown_paths_fall_through_to_not_found() {
    let r = resolve("/menu-items/17/delete");
    assert_eq!(r.name(), RouteName::NotFound);
    assert_eq!(r.param("path_match"), Some("menu-items/17/delete"));
    assert!(!r.meta().requires_auth);
    assert_eq!(resolve("/categories/1/edit/extra").name(), RouteName::NotFound);
}

#[test]
fn decision_table() {
    let protected = RouteName::Dashboard.def().meta;
    let guest = RouteName::Register.def().meta;
    let open = RouteName::Home.def().meta;
    assert_eq!(decide(&protected, false), NavigationDecision::Redirect(RouteName::Login));
    assert_eq!(decide(&protected, true), NavigationDecision::Allow);
    assert_eq!(decide(&guest, true), NavigationDecision::Redirect(RouteName::Dashboard));
    assert_eq!(decide(&guest, false), NavigationDecision::Allow);
    assert_eq!(decide(&open, true), NavigationDecision::Allow);
    assert_eq!(decide(&open, false), NavigationDecision::Allow);
}

#[test]
fn every_dashboard_route_requires_auth() {
    for r in ROUTES.iter().filter(|r| r.path.starts_with("/categories") || r.path.starts_with("/menu-items")) {
        assert!(r.meta.requires_auth, "{} should be protected", r.path);
        assert!(!r.meta.guest_only);
    }
}

#[test]
fn titles_and_landings() {
    assert_eq!(document_title(RouteName::Categories.def(), "Client Digital Menu"), "Menu Categories - Client Digital Menu");
    assert_eq!(document_title(resolve("/nope").route, "Client Digital Menu"), "Page Not Found - Client Digital Menu");
    assert_eq!(landing_after(AuthEvent::LoggedIn), RouteName::Dashboard);
    assert_eq!(landing_after(AuthEvent::Registered), RouteName::Dashboard);
    assert_eq!(landing_after(AuthEvent::LoggedOut), RouteName::Login);
    assert_eq!(RouteName::Login.path(), "/login");
}

mod guard_wait {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::AppConfig;
    use crate::identity::{AuthSync, SessionStore};
    use crate::storage::MemoryStorage;

    fn unresolved_store(cfg: &AppConfig) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(AuthSync::new(Arc::new(MemoryStorage::new()), &cfg.storage_prefix), cfg))
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_session_fails_open_after_timeout() {
        let cfg = AppConfig { guard_resolve_timeout_ms: 250, ..AppConfig::default() };
        let store = unresolved_store(&cfg);
        let guard = RouteGuard::new(Arc::clone(&store), &cfg);
        let started = tokio::time::Instant::now();
        let nav = guard.before_each("/categories").await;
        assert!(nav.is_allowed());
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn resolution_mid_wait_applies_the_decision() {
        let cfg = AppConfig::default();
        let store = unresolved_store(&cfg);
        let guard = RouteGuard::new(Arc::clone(&store), &cfg);
        let waiting = tokio::spawn(async move { guard.before_each("/categories").await });
        tokio::task::yield_now().await;
        store.initialize();
        let nav = waiting.await.unwrap();
        assert_eq!(nav.decision, NavigationDecision::Redirect(RouteName::Login));
    }
}
