//! Authenticated HTTP helpers for the versioned backend API.
//!
//! DESIGN
//! ======
//! Thin wrapper over `reqwest`: every request gets `Authorization` set to the
//! stored token (or empty), holds a loading guard for its lifetime, and
//! resolves to an [`ApiResponse`] whose body is already read. Status handling
//! is left to callers, the same way `fetch` leaves it to `response.ok`.
//!
//! `StatusApi` is the narrow seam the user-state machine depends on, so it can
//! be driven by a fake in tests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::loading::Loading;
use crate::store::Store;

pub const STATUS_PATH: &str = "status/";

// =============================================================================
// RESPONSE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Parse`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

// =============================================================================
// STATUS SEAM
// =============================================================================

/// Source of raw `status/` responses.
#[async_trait::async_trait]
pub trait StatusApi: Send + Sync {
    /// Issue the authenticated status request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] on transport failure. Non-2xx statuses
    /// are returned as responses, not errors.
    async fn fetch_status(&self) -> Result<ApiResponse, ClientError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    store: Arc<dyn Store>,
    loading: Loading,
}

impl ApiClient {
    /// Build a client rooted at `config.api_url()`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, store: Arc<dyn Store>, loading: Loading) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_url: config.api_url(), store, loading })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn loading(&self) -> &Loading {
        &self.loading
    }

    /// Send a request with the stored token attached.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if sending or reading the body fails.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.url(path);
        let token = self.store.token().unwrap_or_default();
        let has_json_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);

        let mut builder = self.http.request(method.clone(), &url).header(AUTHORIZATION, token);
        if has_json_body {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(body) = body {
            let raw = serde_json::to_string(body).map_err(|e| ClientError::Parse(e.to_string()))?;
            builder = builder.body(raw);
        }

        let _loading = self.loading.start();
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        debug!(%method, %url, status, "api request finished");
        Ok(ApiResponse { status, body: text })
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, path: &str, body: Option<&serde_json::Value>) -> Result<ApiResponse, ClientError> {
        self.request(Method::POST, path, body).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, path: &str, body: Option<&serde_json::Value>) -> Result<ApiResponse, ClientError> {
        self.request(Method::PUT, path, body).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch(&self, path: &str, body: Option<&serde_json::Value>) -> Result<ApiResponse, ClientError> {
        self.request(Method::PATCH, path, body).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::DELETE, path, None).await
    }
}

#[async_trait::async_trait]
impl StatusApi for ApiClient {
    async fn fetch_status(&self) -> Result<ApiResponse, ClientError> {
        self.get(STATUS_PATH).await
    }
}

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;
