//! HTTP client for the Bitwarden public API.
//!
//! Thin wrapper over `reqwest` that injects the bearer token and maps
//! non-success statuses to [`BitwardenError::Api`]. Retry and backoff are
//! deliberately absent; they belong to the transport layer in front of
//! this connector.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::TokenCache;
use crate::config::BitwardenConfig;
use crate::error::{BitwardenError, BitwardenResult};

/// Content type the Bitwarden public API expects on write requests.
const CONTENT_TYPE_JSON_PATCH: &str = "application/json-patch+json";

/// Bitwarden public API client.
pub struct BitwardenClient {
    http_client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenCache>,
}

impl BitwardenClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &BitwardenConfig, tokens: Arc<TokenCache>) -> BitwardenResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BitwardenError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> BitwardenResult<reqwest::Response> {
        let token = self.tokens.get_access_token().await?;

        let mut request = self
            .http_client
            .request(method, self.url(path))
            .bearer_auth(&token);

        if let Some(b) = body {
            request = request.json(b);
        }
        request = request.header(header::CONTENT_TYPE, CONTENT_TYPE_JSON_PATCH);

        debug!(path, "Sending request");
        Ok(request.send().await?)
    }

    async fn into_api_error(response: reqwest::Response) -> BitwardenError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        BitwardenError::Api { status, message }
    }

    /// Performs a GET request and deserializes the response body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BitwardenResult<T> {
        let response = self.request::<()>(reqwest::Method::GET, path, None).await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Performs a GET request, mapping 404 to `Ok(None)`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> BitwardenResult<Option<T>> {
        let response = self.request::<()>(reqwest::Method::GET, path, None).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(Some(response.json().await?))
    }

    /// Performs a POST request and deserializes the response body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> BitwardenResult<T> {
        let response = self
            .request(reqwest::Method::POST, path, Some(body))
            .await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Performs a PUT request, discarding any response body.
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> BitwardenResult<()> {
        let response = self.request(reqwest::Method::PUT, path, Some(body)).await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(())
    }

    /// Performs a DELETE request.
    pub async fn delete(&self, path: &str) -> BitwardenResult<()> {
        let response = self
            .request::<()>(reqwest::Method::DELETE, path, None)
            .await?;
        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }
        Ok(())
    }
}
