use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::identity::{AuthResponse, Credentials, RegistrationData, User};

use super::ApiClient;

/// Authentication against the REST backend. Successful login/register persist the
/// returned token and user through the storage sync layer.
#[derive(Clone)]
pub struct RestAuthService {
    api: ApiClient,
}

impl RestAuthService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    fn persist(&self, resp: &AuthResponse) {
        if resp.access_token.is_empty() { return; }
        if !self.api.sync().write(&resp.access_token, &resp.user) {
            warn!(target: "api", "auth response could not be persisted");
        }
    }

    pub async fn register(&self, data: &RegistrationData) -> AppResult<AuthResponse> {
        let resp: AuthResponse = self.api.post("/register", data).await?;
        self.persist(&resp);
        info!(target: "api", user_id = resp.user.id, "registered against backend");
        Ok(resp)
    }

    /// A 401 from `/login` means bad credentials, not an expired session.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<AuthResponse> {
        let resp: AuthResponse = match self.api.post("/login", credentials).await {
            Ok(r) => r,
            Err(AppError::Unauthorized { message, .. }) => {
                return Err(AppError::invalid_credentials("invalid_credentials".to_string(), message));
            }
            Err(e) => return Err(e),
        };
        self.persist(&resp);
        info!(target: "api", user_id = resp.user.id, "logged in against backend");
        Ok(resp)
    }

    /// Local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> AppResult<()> {
        let res: AppResult<serde_json::Value> = self.api.post("/logout", &serde_json::json!({})).await;
        self.api.sync().clear();
        res.map(|_| ())
    }

    pub async fn current_user(&self) -> AppResult<User> { self.api.get("/user").await }
}
