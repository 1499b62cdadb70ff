//! Keeps the session token and user consistent across the legacy and managed storage
//! namespaces.
//!
//! Reads scan a fixed list of key variants in priority order and take the first
//! non-empty value. Writes go to both namespaces. Storage failures are logged and absorbed
//! here; callers only see "nothing found" or a `false` write result.

use tracing::{debug, info, warn};

use crate::storage::{self, Namespace, SharedStorage, StorageResult};

use super::token;
use super::user::{RegisteredUser, User};

pub const TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const USERS_KEY: &str = "mock_users";
const LEGACY_TOKEN_ALIAS: &str = "token";
const MANAGED_USER_ALIAS: &str = "current_user";
/// Every legacy key that can hold part of a session.
const LEGACY_SESSION_KEYS: &[&str] = &[TOKEN_KEY, USER_KEY, LEGACY_TOKEN_ALIAS, "mock_access_token", "mock_user"];
const MANAGED_SESSION_KEYS: &[&str] = &[TOKEN_KEY, USER_KEY, MANAGED_USER_ALIAS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns { Legacy, Managed }

/// Token lookup order.
const TOKEN_SOURCES: &[(Ns, &str)] = &[(Ns::Legacy, TOKEN_KEY), (Ns::Legacy, LEGACY_TOKEN_ALIAS), (Ns::Managed, TOKEN_KEY)];
/// User lookup order.
const USER_SOURCES: &[(Ns, &str)] = &[(Ns::Legacy, USER_KEY), (Ns::Managed, USER_KEY), (Ns::Managed, MANAGED_USER_ALIAS)];

/// Token and user as found in storage, with where each was found.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSession {
    pub token: String,
    pub user: Option<User>,
    pub token_source: String,
    pub user_source: Option<String>,
}

#[derive(Clone)]
pub struct AuthSync {
    backend: SharedStorage,
    legacy: Namespace,
    managed: Namespace,
}

impl AuthSync {
    pub fn new(backend: SharedStorage, managed_prefix: &str) -> Self {
        Self {
            legacy: Namespace::legacy(backend.clone()),
            managed: Namespace::managed(backend.clone(), managed_prefix),
            backend,
        }
    }

    pub fn legacy(&self) -> &Namespace { &self.legacy }
    pub fn managed(&self) -> &Namespace { &self.managed }

    pub fn is_available(&self) -> bool { storage::is_available(self.backend.as_ref()) }

    fn ns(&self, which: Ns) -> &Namespace {
        match which { Ns::Legacy => &self.legacy, Ns::Managed => &self.managed }
    }

    /// Startup housekeeping: check the backend and snapshot the managed namespace. Session
    /// keys stay out of the snapshot so a restore cannot revive a cleared session.
    pub fn prepare(&self) -> bool {
        if !self.is_available() {
            warn!(target: "storage", "storage is not available, session will live in memory only");
            return false;
        }
        absorb("backup", self.managed.backup(MANAGED_SESSION_KEYS));
        true
    }

    /// Persist token and user into both namespaces. Returns true only if every write landed.
    pub fn write(&self, token: &str, user: &User) -> bool {
        let mut ok = true;
        ok &= absorb("legacy token write", self.legacy.set_str(TOKEN_KEY, token)).is_some();
        ok &= absorb("legacy user write", self.legacy.set_json(USER_KEY, user)).is_some();
        ok &= absorb("managed token write", self.managed.set_str(TOKEN_KEY, token)).is_some();
        ok &= absorb("managed user write", self.managed.set_json(USER_KEY, user)).is_some();
        if ok { debug!(target: "auth_sync", user_id = user.id, "session persisted to both namespaces"); }
        ok
    }

    /// First non-empty token and first decodable user across the known key variants.
    pub fn read(&self) -> Option<PersistedSession> {
        let Some((token, token_source)) = self.lookup_token(|v| !v.trim().is_empty()) else {
            debug!(target: "auth_sync", "no token found in any location");
            return None;
        };
        let (user, user_source) = self.lookup_user();
        Some(PersistedSession { token, user, token_source, user_source })
    }

    /// First token in lookup order that `accept` takes, with its source label.
    fn lookup_token(&self, accept: impl Fn(&str) -> bool) -> Option<(String, String)> {
        for (ns, key) in TOKEN_SOURCES.iter() {
            let namespace = self.ns(*ns);
            match namespace.get_str(key) {
                Ok(Some(v)) if accept(&v) => {
                    debug!(target: "auth_sync", source = %source_label(namespace, key), "token found");
                    return Some((v, source_label(namespace, key)));
                }
                Ok(Some(_)) => debug!(target: "auth_sync", source = %source_label(namespace, key), "token skipped"),
                Ok(None) => {}
                Err(e) => warn!(target: "auth_sync", source = %source_label(namespace, key), error = %e, "token lookup failed"),
            }
        }
        None
    }

    fn lookup_user(&self) -> (Option<User>, Option<String>) {
        for (ns, key) in USER_SOURCES.iter() {
            let namespace = self.ns(*ns);
            match namespace.get_json::<User>(key) {
                Ok(Some(u)) => {
                    debug!(target: "auth_sync", source = %source_label(namespace, key), "user found");
                    return (Some(u), Some(source_label(namespace, key)));
                }
                Ok(None) => {}
                Err(e) => warn!(target: "auth_sync", source = %source_label(namespace, key), error = %e, "failed to parse user"),
            }
        }
        (None, None)
    }

    /// Remove the session pair and its aliases from both namespaces. The registered-users
    /// list is kept.
    pub fn clear(&self) {
        absorb("legacy clear", self.legacy.remove_all(LEGACY_SESSION_KEYS));
        absorb("managed clear", self.managed.remove_all(MANAGED_SESSION_KEYS));
        debug!(target: "auth_sync", "session cleared from both namespaces");
    }

    /// Find a well-formed token and a decodable user anywhere and rewrite them into both
    /// namespaces. Malformed tokens earlier in lookup order are skipped and overwritten.
    /// Returns whether such a pair was found.
    pub fn reconcile(&self) -> bool {
        let Some((token, token_source)) = self.lookup_token(|v| token::decode(v).is_some()) else {
            debug!(target: "auth_sync", "no well-formed token in any location");
            return false;
        };
        let (Some(user), _) = self.lookup_user() else {
            debug!(target: "auth_sync", "token without user, nothing to reconcile");
            return false;
        };
        if !self.write(&token, &user) {
            warn!(target: "auth_sync", "reconcile could not write every namespace");
        }
        info!(target: "auth_sync", token_source = %token_source, user_id = user.id, "authentication synced");
        true
    }

    /// Registered users for mock login; legacy list first, managed as fallback.
    pub fn registered_users(&self) -> Vec<RegisteredUser> {
        for ns in [&self.legacy, &self.managed] {
            match ns.get_json::<Vec<RegisteredUser>>(USERS_KEY) {
                Ok(Some(list)) => return list,
                Ok(None) => {}
                Err(e) => warn!(target: "auth_sync", namespace = ns.label(), error = %e, "registered users unreadable"),
            }
        }
        Vec::new()
    }

    pub fn save_registered_users(&self, users: &[RegisteredUser]) -> bool {
        let a = absorb("legacy users write", self.legacy.set_json(USERS_KEY, users)).is_some();
        let b = absorb("managed users write", self.managed.set_json(USERS_KEY, users)).is_some();
        a && b
    }
}

fn source_label(ns: &Namespace, key: &str) -> String { format!("{}:{}", ns.label(), key) }

/// Log a storage failure and turn it into `None`.
fn absorb<T>(what: &str, res: StorageResult<T>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "storage", op = what, error = %e, "storage operation failed, continuing without persistence");
            None
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
