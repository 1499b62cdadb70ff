//! Application configuration.
//! Defaults mirror the deployed client; `DIGITAL_MENU_*` environment variables override
//! both the defaults and any JSON file passed to [`AppConfig::load`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_PREFIX: &str = "digital_menu_";
pub const DEFAULT_API_BASE_URL: &str = "https://laravelapi.mebrejderma.com/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    /// Key prefix of the managed storage namespace.
    pub storage_prefix: String,
    /// Lifetime of issued session tokens.
    pub token_ttl_secs: i64,
    pub items_per_page: usize,
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    /// Artificial delay awaited inside register/login, emulating a backend round trip.
    pub simulated_latency_ms: u64,
    /// How long the route guard waits for session restoration before failing open.
    pub guard_resolve_timeout_ms: u64,
    /// Backing file for persisted storage; in-memory when unset.
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Client Digital Menu".to_string(),
            storage_prefix: DEFAULT_PREFIX.to_string(),
            token_ttl_secs: 86_400,
            items_per_page: 10,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_ms: 10_000,
            simulated_latency_ms: 0,
            guard_resolve_timeout_ms: 2_000,
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env(|k| std::env::var(k).ok());
        cfg
    }

    /// Read a JSON config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading config file {}", path.display()))?;
        let mut cfg: AppConfig = serde_json::from_slice(&bytes).with_context(|| format!("parsing config file {}", path.display()))?;
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Apply overrides from an arbitrary lookup (the process environment in production).
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(v) = lookup("DIGITAL_MENU_APP_NAME") { self.app_name = v; }
        if let Some(v) = lookup("DIGITAL_MENU_STORAGE_PREFIX") { self.storage_prefix = v; }
        if let Some(v) = lookup("DIGITAL_MENU_API_BASE_URL") { self.api_base_url = v.trim_end_matches('/').to_string(); }
        if let Some(v) = lookup("DIGITAL_MENU_STORAGE_PATH") { if !v.trim().is_empty() { self.storage_path = Some(PathBuf::from(v)); } }
        parse_into(&lookup, "DIGITAL_MENU_TOKEN_TTL_SECS", &mut self.token_ttl_secs);
        parse_into(&lookup, "DIGITAL_MENU_ITEMS_PER_PAGE", &mut self.items_per_page);
        parse_into(&lookup, "DIGITAL_MENU_API_TIMEOUT_MS", &mut self.api_timeout_ms);
        parse_into(&lookup, "DIGITAL_MENU_SIMULATED_LATENCY_MS", &mut self.simulated_latency_ms);
        parse_into(&lookup, "DIGITAL_MENU_GUARD_RESOLVE_TIMEOUT_MS", &mut self.guard_resolve_timeout_ms);
        if self.items_per_page == 0 { self.items_per_page = 1; }
    }

    pub fn api_timeout(&self) -> Duration { Duration::from_millis(self.api_timeout_ms) }
    pub fn simulated_latency(&self) -> Duration { Duration::from_millis(self.simulated_latency_ms) }
    pub fn guard_resolve_timeout(&self) -> Duration { Duration::from_millis(self.guard_resolve_timeout_ms) }
}

fn parse_into<T, F>(lookup: &F, key: &str, slot: &mut T)
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else { return; };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => warn!(target: "config", key = key, value = %raw, "ignoring unparseable override"),
    }
}
