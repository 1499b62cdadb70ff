use super::*;
use std::sync::Arc;

use chrono::Utc;

use crate::identity::user::DEMO_ACCOUNT;
use crate::storage::{KeyValueStorage, MemoryStorage};

fn setup() -> (MemoryStorage, AuthSync) {
    let mem = MemoryStorage::new();
    let sync = AuthSync::new(Arc::new(mem.clone()), "digital_menu_");
    (mem, sync)
}

fn demo_pair() -> (String, User) {
    let user = DEMO_ACCOUNT.user(Utc::now());
    (token::issue(user.id, &user, 3600), user)
}

#[test]
fn write_lands_in_both_namespaces() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    assert!(sync.write(&tok, &user));
    assert_eq!(mem.get("access_token").unwrap().as_deref(), Some(tok.as_str()));
    assert_eq!(sync.managed().get_str(TOKEN_KEY).unwrap().as_deref(), Some(tok.as_str()));
    assert_eq!(sync.managed().get_json::<User>(USER_KEY).unwrap(), Some(user.clone()));
    let found = sync.read().unwrap();
    assert_eq!(found.token_source, "legacy:access_token");
    assert_eq!(found.user, Some(user));
}

#[test]
fn read_checks_aliases_in_order() {
    let (mem, sync) = setup();
    assert!(sync.read().is_none());

    mem.set("digital_menu_access_token", "\"managed.tok.en\"").unwrap();
    assert_eq!(sync.read().unwrap().token_source, "managed:access_token");

    mem.set("token", "alias.tok.en").unwrap();
    let found = sync.read().unwrap();
    assert_eq!(found.token, "alias.tok.en");
    assert_eq!(found.token_source, "legacy:token");

    // blank values do not count
    mem.set("access_token", "   ").unwrap();
    assert_eq!(sync.read().unwrap().token_source, "legacy:token");
}

#[test]
fn unparseable_user_falls_through_to_next_source() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    mem.set("access_token", &tok).unwrap();
    mem.set("user", "{broken").unwrap();
    sync.managed().set_json(MANAGED_USER_ALIAS, &user).unwrap();
    let found = sync.read().unwrap();
    assert_eq!(found.user_source.as_deref(), Some("managed:current_user"));
    assert_eq!(found.user.unwrap().email, DEMO_ACCOUNT.email);
}

#[test]
fn reconcile_propagates_legacy_pair_into_managed() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    mem.set("access_token", &tok).unwrap();
    mem.set("user", &serde_json::to_string(&user).unwrap()).unwrap();
    assert!(sync.managed().get_str(TOKEN_KEY).unwrap().is_none());

    assert!(sync.reconcile());
    assert_eq!(sync.managed().get_str(TOKEN_KEY).unwrap(), Some(tok));
    assert_eq!(sync.managed().get_json::<User>(USER_KEY).unwrap(), Some(user));
}

#[test]
fn reconcile_rejects_malformed_token_and_missing_user() {
    let (mem, sync) = setup();
    mem.set("access_token", "not-a-token").unwrap();
    assert!(!sync.reconcile());
    assert!(sync.managed().get_str(TOKEN_KEY).unwrap().is_none());

    let (tok, _) = demo_pair();
    mem.set("access_token", &tok).unwrap();
    assert!(!sync.reconcile());
}

#[test]
fn reconcile_skips_malformed_legacy_token_for_valid_managed_pair() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    sync.managed().set_str(TOKEN_KEY, &tok).unwrap();
    sync.managed().set_json(USER_KEY, &user).unwrap();
    mem.set("access_token", "garbage").unwrap();

    assert!(sync.reconcile());
    assert_eq!(mem.get("access_token").unwrap(), Some(tok.clone()));
    assert_eq!(sync.legacy().get_json::<User>(USER_KEY).unwrap(), Some(user));
    assert_eq!(sync.read().map(|p| p.token), Some(tok));
}

#[test]
fn clear_keeps_registered_users() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    sync.write(&tok, &user);
    mem.set("mock_access_token", "x").unwrap();
    mem.set("mock_user", "{}").unwrap();
    let reg = RegisteredUser { user: user.clone(), password: "secret1".into() };
    assert!(sync.save_registered_users(&[reg.clone()]));

    sync.clear();
    assert!(sync.read().is_none());
    assert!(mem.get("mock_access_token").unwrap().is_none());
    assert!(mem.get("digital_menu_user").unwrap().is_none());
    assert_eq!(sync.registered_users(), vec![reg]);
}

#[test]
fn registered_users_fall_back_to_managed_list() {
    let (mem, sync) = setup();
    let (_, user) = demo_pair();
    let reg = RegisteredUser { user, password: "pw1234".into() };
    sync.managed().set_json(USERS_KEY, &vec![reg.clone()]).unwrap();
    assert_eq!(sync.registered_users(), vec![reg]);
    mem.set("mock_users", "[]").unwrap();
    assert!(sync.registered_users().is_empty());
}

#[test]
fn unavailable_storage_degrades_to_noops() {
    let (mem, sync) = setup();
    let (tok, user) = demo_pair();
    mem.set_available(false);
    assert!(!sync.is_available());
    assert!(!sync.prepare());
    assert!(!sync.write(&tok, &user));
    assert!(sync.read().is_none());
    assert!(!sync.reconcile());
    sync.clear();
    assert!(sync.registered_users().is_empty());
    mem.set_available(true);
    assert!(sync.read().is_none());
}
