//! In-memory authentication state backed by persisted storage.
//!
//! The store is an explicitly constructed service: build it with [`SessionStore::init`]
//! (or [`SessionStore::new`] followed by [`SessionStore::initialize`]) and share it by
//! reference. State is published through a `tokio::sync::watch` channel so consumers can
//! react to changes.
//!
//! Operations are not serialised against each other. A `login` racing a `logout` ends in
//! whichever state was written last, and `loading` follows the same rule.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::validation;

use super::sync::AuthSync;
use super::token;
use super::user::{AuthResponse, Credentials, DEMO_ACCOUNT, RegisteredUser, RegistrationData, User};

pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True while register/login/logout is in flight.
    pub loading: bool,
    /// Last user-facing error, cleared explicitly or by the next operation.
    pub error: Option<String>,
    /// Set once restoration from storage has run.
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Loading,
    Authenticated,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.as_deref().map(token::is_active).unwrap_or(false)
    }

    pub fn status(&self) -> SessionStatus {
        if self.loading { SessionStatus::Loading }
        else if self.is_authenticated() { SessionStatus::Authenticated }
        else { SessionStatus::Anonymous }
    }
}

/// What an operation did, for the presentation layer to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Registered,
    LoggedIn,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub event: AuthEvent,
    pub message: String,
    pub payload: Option<AuthResponse>,
}

pub struct SessionStore {
    sync: AuthSync,
    state: watch::Sender<SessionSnapshot>,
    ttl_secs: i64,
    latency: Duration,
}

/// Holds `loading` for the lifetime of an operation, resetting it on every exit path.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a watch::Sender<SessionSnapshot>) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) { self.state.send_modify(|s| s.loading = false); }
}

fn same_email(a: &str, b: &str) -> bool { a.trim().eq_ignore_ascii_case(b.trim()) }

impl SessionStore {
    /// Unresolved store; call [`SessionStore::initialize`] or
    /// [`SessionStore::restore_in_background`] before relying on its state.
    pub fn new(sync: AuthSync, config: &AppConfig) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { sync, state, ttl_secs: config.token_ttl_secs, latency: config.simulated_latency() }
    }

    /// Build and restore synchronously.
    pub fn init(sync: AuthSync, config: &AppConfig) -> Arc<Self> {
        let store = Arc::new(Self::new(sync, config));
        store.initialize();
        store
    }

    /// Restore the session from storage. A persisted pair is adopted only when the token
    /// is active and the user decodes; anything else found in storage is cleared.
    pub fn initialize(&self) {
        self.sync.prepare();
        let restored = match self.sync.read() {
            None => None,
            Some(found) if !token::is_active(&found.token) => {
                info!(target: "session", source = %found.token_source, "persisted token invalid or expired, clearing storage");
                self.sync.clear();
                None
            }
            Some(found) => match found.user {
                Some(user) => {
                    info!(target: "session", user_id = user.id, source = %found.token_source, "session restored from storage");
                    Some((found.token, user))
                }
                None => {
                    warn!(target: "session", "active token without a stored user, clearing storage");
                    self.sync.clear();
                    None
                }
            },
        };
        self.state.send_modify(|s| {
            match restored {
                Some((tok, user)) => { s.token = Some(tok); s.user = Some(user); }
                None => { s.token = None; s.user = None; }
            }
            s.resolved = true;
        });
    }

    /// Run restoration on the runtime after the configured latency.
    pub fn restore_in_background(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.simulate_latency().await;
            this.initialize();
        })
    }

    /// Drop in-memory state. Persisted storage is left as is, so a new store restores it.
    pub fn dispose(&self) {
        self.state.send_replace(SessionSnapshot { resolved: true, ..SessionSnapshot::default() });
        debug!(target: "session", "session store disposed");
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() { tokio::time::sleep(self.latency).await; }
    }

    fn fail(&self, err: AppError) -> AppError {
        let msg = err.message().to_string();
        warn!(target: "session", code = err.code_str(), error = %msg, "auth operation failed");
        self.state.send_modify(|s| s.error = Some(msg));
        err
    }

    fn establish(&self, user: User) -> AuthResponse {
        let tok = token::issue(user.id, &user, self.ttl_secs);
        if !self.sync.write(&tok, &user) {
            warn!(target: "session", user_id = user.id, "session could not be persisted, keeping it in memory");
        }
        self.state.send_modify(|s| {
            s.token = Some(tok.clone());
            s.user = Some(user.clone());
            s.error = None;
        });
        AuthResponse { access_token: tok, token_type: TOKEN_TYPE.to_string(), expires_in: self.ttl_secs, user }
    }

    pub async fn register(&self, data: RegistrationData) -> AppResult<AuthOutcome> {
        let _busy = LoadingGuard::enter(&self.state);
        self.simulate_latency().await;
        debug!(target: "session", email = %data.email, "register attempt");

        validation::check_registration(&data).map_err(|e| self.fail(e))?;

        let mut users = self.sync.registered_users();
        if same_email(&data.email, DEMO_ACCOUNT.email) || users.iter().any(|u| same_email(&u.user.email, &data.email)) {
            return Err(self.fail(AppError::duplicate_email(
                "email_taken",
                "Email already registered. Please use a different email or login.",
            )));
        }

        let id = users.iter().map(|u| u.user.id).chain(std::iter::once(DEMO_ACCOUNT.id)).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let user = User {
            id,
            name: data.name.trim().to_string(),
            email: data.email.trim().to_string(),
            phone: data.phone.trim().to_string(),
            business_name: data.business_name.trim().to_string(),
            tin: data.tin.trim().to_string(),
            email_verified_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let payload = self.establish(user.clone());
        users.push(RegisteredUser { user, password: data.password });
        if !self.sync.save_registered_users(&users) {
            warn!(target: "session", "registered users list not persisted");
        }
        info!(target: "session", user_id = id, "registration successful");
        Ok(AuthOutcome {
            event: AuthEvent::Registered,
            message: format!(
                "Welcome {}! Your business \"{}\" has been registered successfully.",
                payload.user.name, payload.user.business_name
            ),
            payload: Some(payload),
        })
    }

    pub async fn login(&self, credentials: Credentials) -> AppResult<AuthOutcome> {
        let _busy = LoadingGuard::enter(&self.state);
        self.simulate_latency().await;
        debug!(target: "session", email = %credentials.email, remember = credentials.remember, "login attempt");

        let (user, message) = if DEMO_ACCOUNT.matches(&credentials) {
            (DEMO_ACCOUNT.user(Utc::now()), "Login successful with test account")
        } else {
            let found = self.sync.registered_users().into_iter()
                .find(|u| same_email(&u.user.email, &credentials.email) && u.password == credentials.password);
            match found {
                Some(reg) => (reg.user, "Login successful!"),
                None => {
                    return Err(self.fail(AppError::invalid_credentials("invalid_credentials", "Invalid email or password.")));
                }
            }
        };
        let payload = self.establish(user);
        info!(target: "session", user_id = payload.user.id, "login successful");
        Ok(AuthOutcome { event: AuthEvent::LoggedIn, message: message.to_string(), payload: Some(payload) })
    }

    /// Always succeeds; persistence failures are logged by the sync layer.
    pub async fn logout(&self) -> AuthOutcome {
        let _busy = LoadingGuard::enter(&self.state);
        self.simulate_latency().await;
        self.invalidate();
        info!(target: "session", "logged out");
        AuthOutcome { event: AuthEvent::LoggedOut, message: "Logged out successfully.".to_string(), payload: None }
    }

    pub fn clear_error(&self) { self.state.send_modify(|s| s.error = None); }

    fn invalidate(&self) {
        self.sync.clear();
        self.state.send_modify(|s| {
            s.user = None;
            s.token = None;
        });
    }

    /// True when the held token is active. An expired or malformed token tears the session
    /// down.
    pub fn validate_current_token(&self) -> bool {
        let snap = self.snapshot();
        match snap.token.as_deref() {
            Some(t) if token::is_active(t) => true,
            Some(_) => {
                info!(target: "session", "session token no longer active, clearing session");
                self.invalidate();
                false
            }
            None => false,
        }
    }

    /// Refresh the user from storage while the token is active; otherwise clear.
    pub fn fetch_current_user(&self) -> Option<User> {
        if !self.validate_current_token() {
            if self.user().is_some() { self.invalidate(); }
            return None;
        }
        match self.sync.read().and_then(|p| p.user) {
            Some(user) => {
                self.state.send_modify(|s| s.user = Some(user.clone()));
                Some(user)
            }
            None => self.user(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot { self.state.borrow().clone() }
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> { self.state.subscribe() }
    pub fn status(&self) -> SessionStatus { self.state.borrow().status() }
    pub fn is_authenticated(&self) -> bool { self.state.borrow().is_authenticated() }
    pub fn is_resolved(&self) -> bool { self.state.borrow().resolved }
    pub fn is_loading(&self) -> bool { self.state.borrow().loading }
    pub fn error(&self) -> Option<String> { self.state.borrow().error.clone() }
    pub fn user(&self) -> Option<User> { self.state.borrow().user.clone() }
    pub fn token(&self) -> Option<String> { self.state.borrow().token.clone() }
    pub fn user_name(&self) -> String { self.state.borrow().user.as_ref().map(|u| u.name.clone()).unwrap_or_default() }
    pub fn business_name(&self) -> String {
        self.state.borrow().user.as_ref().map(|u| u.business_name.clone()).unwrap_or_default()
    }
    pub fn sync(&self) -> &AuthSync { &self.sync }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
