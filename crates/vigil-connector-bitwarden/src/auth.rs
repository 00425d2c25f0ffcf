//! OAuth2 client-credentials authentication for the Bitwarden public API.

use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use uuid::Uuid;

use vigil_connector::instance::{ApplicationInstance, InstanceStore, TokenRecord};

use crate::config::{OAUTH_GRANT_TYPE, OAUTH_SCOPE};
use crate::error::{BitwardenError, BitwardenResult};
use crate::model::TokenResponse;

/// Token cache for one application instance.
///
/// The cached token lives in the instance configuration record, so every
/// worker sharing the instance store sees the same token. Two concurrent
/// refreshes both succeed and overwrite each other's record; the overwrite
/// is idempotent.
pub struct TokenCache {
    instance_id: Uuid,
    token_url: String,
    instances: Arc<dyn InstanceStore>,
    http_client: reqwest::Client,
}

impl TokenCache {
    /// Creates a new token cache.
    pub fn new(
        instance_id: Uuid,
        token_url: impl Into<String>,
        instances: Arc<dyn InstanceStore>,
    ) -> Self {
        Self {
            instance_id,
            token_url: token_url.into(),
            instances,
            http_client: reqwest::Client::new(),
        }
    }

    /// Gets a valid access token, refreshing if the stored one is absent
    /// or past its expiration.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn get_access_token(&self) -> BitwardenResult<String> {
        let instance = self.load_instance().await?;

        if let Some(token) = &instance.access_token {
            if !token.is_expired() {
                debug!("Using cached access token");
                return Ok(token.access_token.clone());
            }
        }

        debug!("Refreshing access token");
        self.refresh_access_token().await
    }

    /// Performs the client-credentials grant and persists the new token
    /// record wholesale.
    ///
    /// The grant call is not retried here; transport and auth failures
    /// propagate to the caller.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn refresh_access_token(&self) -> BitwardenResult<String> {
        let instance = self.load_instance().await?;

        let params = [
            ("grant_type", OAUTH_GRANT_TYPE),
            ("scope", OAUTH_SCOPE),
            ("client_id", instance.credentials.client_id.as_str()),
            (
                "client_secret",
                instance.credentials.client_secret.expose_secret().as_str(),
            ),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BitwardenError::TokenRefresh(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| BitwardenError::Auth(format!("failed to parse token response: {e}")))?;

        let record = TokenRecord {
            access_token: token_response.access_token,
            expiration: Utc::now() + Duration::seconds(token_response.expires_in),
        };

        self.instances
            .save_token(self.instance_id, record.clone())
            .await?;

        debug!(expiration = %record.expiration, "Persisted refreshed token");

        Ok(record.access_token)
    }

    async fn load_instance(&self) -> BitwardenResult<ApplicationInstance> {
        self.instances
            .load(self.instance_id)
            .await?
            .ok_or_else(|| {
                BitwardenError::Config(format!(
                    "unknown application instance {}",
                    self.instance_id
                ))
            })
    }
}
