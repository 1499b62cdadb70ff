//! HTTP client for the REST backend.
//!
//! Every request carries the persisted bearer token when one exists. A 401 response clears
//! the persisted session before the error is returned.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{handle_api_error, AppError, AppResult, BackendErrorBody};
use crate::identity::AuthSync;

mod auth;
mod catalog;

pub use auth::RestAuthService;
pub use catalog::RestCatalogService;

/// Some endpoints wrap single resources in `{"data": ...}`, others return them bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> MaybeWrapped<T> {
    fn into_inner(self) -> T {
        match self { MaybeWrapped::Wrapped { data } => data, MaybeWrapped::Bare(t) => t }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
    sync: AuthSync,
}

fn network_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::network("timeout".to_string(), "The request timed out. Please try again.".to_string())
    } else {
        AppError::network("network_error".to_string(), format!("Network error. Please check your connection. ({})", e))
    }
}

impl ApiClient {
    pub fn new(config: &AppConfig, sync: AuthSync) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::internal("client_build".to_string(), e.to_string()))?;
        Ok(Self { base: config.api_base_url.trim_end_matches('/').to_string(), client, sync })
    }

    pub fn base_url(&self) -> &str { &self.base }
    pub fn sync(&self) -> &AuthSync { &self.sync }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') { format!("{}{}", self.base, path) } else { format!("{}/{}", self.base, path) }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match self.sync.read() {
            Some(found) => req.bearer_auth(found.token),
            None => {
                debug!(target: "api", path, "no authentication token found");
                req
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let resp = req.send().await.map_err(network_error)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(network_error)?;
        if status.as_u16() == 401 {
            warn!(target: "api", "authentication required, clearing persisted session");
            self.sync.clear();
        }
        if !status.is_success() {
            let body: BackendErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            debug!(target: "api", status = status.as_u16(), message = ?body.message, "request failed");
            return Err(handle_api_error(status.as_u16(), &body));
        }
        let body: &[u8] = if bytes.iter().all(|b| b.is_ascii_whitespace()) { b"null" } else { &bytes };
        serde_json::from_slice::<MaybeWrapped<T>>(body)
            .map(MaybeWrapped::into_inner)
            .map_err(|e| AppError::internal("invalid_response".to_string(), format!("unexpected response body: {}", e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> AppResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let _: serde_json::Value = self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}
