//! Session lifecycle integration tests: file-backed persistence across store instances,
//! and the route guard waiting on restoration before deciding.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::tempdir;

use digital_menu::config::AppConfig;
use digital_menu::identity::{AuthEvent, AuthSync, Credentials, RegistrationData, SessionStore, DEMO_ACCOUNT};
use digital_menu::router::{landing_after, NavigationDecision, RouteGuard, RouteName};
use digital_menu::storage::{FileStorage, KeyValueStorage, MemoryStorage, SharedStorage};

fn open_sync(path: &std::path::Path, cfg: &AppConfig) -> Result<AuthSync> {
    let backend: SharedStorage = Arc::new(FileStorage::open(path)?);
    Ok(AuthSync::new(backend, &cfg.storage_prefix))
}

fn owner(email: &str) -> RegistrationData {
    RegistrationData {
        name: "Selam Bekele".into(),
        email: email.into(),
        phone: "+251 911 000 111".into(),
        business_name: "Selam Cafe".into(),
        tin: "0012345678".into(),
        password: "injera42".into(),
        password_confirmation: "injera42".into(),
    }
}

#[tokio::test]
async fn registration_survives_reload_and_logout() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let cfg = AppConfig::default();

    let first = SessionStore::init(open_sync(&path, &cfg)?, &cfg);
    let out = first.register(owner("selam@example.com")).await?;
    assert_eq!(landing_after(out.event), RouteName::Dashboard);
    drop(first);

    // a fresh process sees the persisted session
    let reloaded = SessionStore::init(open_sync(&path, &cfg)?, &cfg);
    assert!(reloaded.is_authenticated());
    assert_eq!(reloaded.business_name(), "Selam Cafe");

    let out = reloaded.logout().await;
    assert_eq!(out.event, AuthEvent::LoggedOut);
    assert_eq!(landing_after(out.event), RouteName::Login);

    let after_logout = SessionStore::init(open_sync(&path, &cfg)?, &cfg);
    assert!(!after_logout.is_authenticated());
    let creds = Credentials { email: "SELAM@example.com ".into(), password: "injera42".into(), remember: false };
    let out = after_logout.login(creds).await?;
    assert_eq!(out.message, "Login successful!");
    assert_eq!(after_logout.user().map(|u| u.id), Some(2));
    Ok(())
}

#[tokio::test]
async fn guard_follows_session_state() -> Result<()> {
    let cfg = AppConfig::default();
    let mem = MemoryStorage::new();
    let store = SessionStore::init(AuthSync::new(Arc::new(mem.clone()), &cfg.storage_prefix), &cfg);
    let guard = RouteGuard::new(Arc::clone(&store), &cfg);

    let nav = guard.before_each("/menu-items?page=2").await;
    assert_eq!(nav.decision, NavigationDecision::Redirect(RouteName::Login));
    assert_eq!(guard.title_for(&nav), "Login - Client Digital Menu");

    let creds = Credentials { email: DEMO_ACCOUNT.email.into(), password: DEMO_ACCOUNT.password.into(), remember: false };
    store.login(creds).await?;
    assert!(guard.before_each("/menu-items").await.is_allowed());
    let nav = guard.before_each("/login").await;
    assert_eq!(nav.target(), RouteName::Dashboard);

    // storage wiped behind the store's back; the snapshot still holds the session
    for k in mem.keys()? { mem.remove(&k)?; }
    assert!(guard.before_each("/categories").await.is_allowed());
    store.logout().await;
    assert_eq!(guard.before_each("/categories").await.target_path(), "/login");
    Ok(())
}

#[tokio::test]
async fn guard_waits_for_background_restore() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let cfg = AppConfig::default();
    {
        let seed = SessionStore::init(open_sync(&path, &cfg)?, &cfg);
        seed.register(owner("wait@example.com")).await?;
    }

    let store = Arc::new(SessionStore::new(open_sync(&path, &cfg)?, &cfg));
    assert!(!store.is_resolved());
    let guard = RouteGuard::new(Arc::clone(&store), &cfg);
    let pending = tokio::spawn(async move { guard.before_each("/dashboard").await });
    store.restore_in_background().await?;
    let nav = pending.await?;
    assert!(nav.is_allowed());
    assert_eq!(nav.requested.name(), RouteName::Dashboard);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn guard_fails_open_when_restore_never_finishes() -> Result<()> {
    let cfg = AppConfig { guard_resolve_timeout_ms: 500, ..AppConfig::default() };
    let mem = MemoryStorage::new();
    let store = Arc::new(SessionStore::new(AuthSync::new(Arc::new(mem), &cfg.storage_prefix), &cfg));
    let guard = RouteGuard::new(Arc::clone(&store), &cfg);

    let started = tokio::time::Instant::now();
    let nav = guard.before_each("/dashboard").await;
    assert!(nav.is_allowed());
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(!store.is_resolved());
    Ok(())
}
