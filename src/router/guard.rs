use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::identity::SessionStore;

use super::{decide, document_title, resolve, NavigationDecision, ResolvedRoute, RouteName};

/// Result of a guarded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: ResolvedRoute,
    pub decision: NavigationDecision,
}

impl Navigation {
    /// Route the user actually lands on.
    pub fn target(&self) -> RouteName {
        match self.decision {
            NavigationDecision::Allow => self.requested.name(),
            NavigationDecision::Redirect(to) => to,
        }
    }

    pub fn target_path(&self) -> String {
        match self.decision {
            NavigationDecision::Allow => self.requested.path.clone(),
            NavigationDecision::Redirect(to) => to.path().to_string(),
        }
    }

    pub fn is_allowed(&self) -> bool { self.decision == NavigationDecision::Allow }
}

/// Runs before every navigation, consulting the session store.
pub struct RouteGuard {
    store: Arc<SessionStore>,
    resolve_timeout: Duration,
    app_name: String,
}

impl RouteGuard {
    pub fn new(store: Arc<SessionStore>, config: &AppConfig) -> Self {
        Self { store, resolve_timeout: config.guard_resolve_timeout(), app_name: config.app_name.clone() }
    }

    /// Waits for session restoration, bounded by the configured timeout. If the session
    /// never resolves, navigation is allowed and the anomaly logged.
    pub async fn before_each(&self, path: &str) -> Navigation {
        let requested = resolve(path);
        if !self.wait_resolved().await {
            warn!(target: "router", path = %requested.path, "session state unresolved, allowing navigation");
            return Navigation { requested, decision: NavigationDecision::Allow };
        }
        let authenticated = self.store.is_authenticated();
        let decision = decide(requested.meta(), authenticated);
        debug!(target: "router", path = %requested.path, route = ?requested.name(), authenticated, decision = ?decision, "navigation");
        Navigation { requested, decision }
    }

    async fn wait_resolved(&self) -> bool {
        let mut rx = self.store.subscribe();
        if rx.borrow_and_update().resolved { return true; }
        // the watch::Ref inside the result borrows rx, so settle it before rx drops
        let resolved = matches!(tokio::time::timeout(self.resolve_timeout, rx.wait_for(|s| s.resolved)).await, Ok(Ok(_)));
        resolved
    }

    /// Title for the page the navigation landed on.
    pub fn title_for(&self, nav: &Navigation) -> String {
        match nav.decision {
            NavigationDecision::Allow => document_title(nav.requested.route, &self.app_name),
            NavigationDecision::Redirect(to) => document_title(to.def(), &self.app_name),
        }
    }
}
