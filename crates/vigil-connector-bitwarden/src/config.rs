//! Configuration for the Bitwarden connector.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BitwardenError, BitwardenResult};

/// Production Bitwarden public API base URL.
pub const DEFAULT_API_URL: &str = "https://api.bitwarden.com";

/// Production token endpoint for the client-credentials grant.
pub const DEFAULT_TOKEN_URL: &str = "https://identity.bitwarden.com/connect/token";

/// OAuth grant type used against the token endpoint.
pub const OAUTH_GRANT_TYPE: &str = "client_credentials";

/// OAuth scope for organization-level API access.
pub const OAUTH_SCOPE: &str = "api.organization";

/// Bitwarden connector configuration.
///
/// The endpoints default to the hosted Bitwarden cloud; self-hosted
/// deployments and tests override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitwardenConfig {
    /// Public API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BitwardenConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_url: default_token_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BitwardenConfig {
    /// Create a configuration pointing at the hosted Bitwarden cloud.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the public API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Validate the configured endpoints.
    pub fn validate(&self) -> BitwardenResult<()> {
        Url::parse(&self.api_url)
            .map_err(|e| BitwardenError::Config(format!("invalid api_url: {e}")))?;
        Url::parse(&self.token_url)
            .map_err(|e| BitwardenError::Config(format!("invalid token_url: {e}")))?;
        Ok(())
    }
}
