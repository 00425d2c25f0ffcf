//! The Bitwarden connector and its platform trait implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_connector::entitlement::{Entitlement, GrantInput, IdentityEntitlement};
use vigil_connector::error::ConnectorResult;
use vigil_connector::identity::Identity;
use vigil_connector::instance::ApplicationInstance;
use vigil_connector::platform::Platform;
use vigil_connector::traits::{Connector, DirectorySync, Provisionable};

use crate::auth::TokenCache;
use crate::client::BitwardenClient;
use crate::config::BitwardenConfig;
use crate::error::{BitwardenError, BitwardenResult};
use crate::model::{ListResponse, Member, ACCESS_ALL_ATTRIBUTE};

/// Connector for one Bitwarden organization.
pub struct BitwardenConnector {
    config: BitwardenConfig,
    instance_id: Uuid,
    display_name: String,
    client: BitwardenClient,
    tokens: Arc<TokenCache>,
    platform: Platform,
}

impl BitwardenConnector {
    /// Creates a connector for an application instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: BitwardenConfig,
        instance_id: Uuid,
        platform: Platform,
    ) -> BitwardenResult<Self> {
        config.validate()?;

        let tokens = Arc::new(TokenCache::new(
            instance_id,
            config.token_url.clone(),
            platform.instances.clone(),
        ));
        let client = BitwardenClient::new(&config, Arc::clone(&tokens))?;

        Ok(Self {
            config,
            instance_id,
            display_name: "Bitwarden".to_string(),
            client,
            tokens,
            platform,
        })
    }

    /// The application instance this connector serves.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// The connector configuration.
    #[must_use]
    pub fn config(&self) -> &BitwardenConfig {
        &self.config
    }

    /// The token cache shared by this connector's API calls.
    #[must_use]
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub(crate) fn client(&self) -> &BitwardenClient {
        &self.client
    }

    pub(crate) fn platform(&self) -> &Platform {
        &self.platform
    }

    pub(crate) async fn load_instance(&self) -> BitwardenResult<ApplicationInstance> {
        self.platform
            .instances
            .load(self.instance_id)
            .await?
            .ok_or_else(|| {
                BitwardenError::Config(format!(
                    "unknown application instance {}",
                    self.instance_id
                ))
            })
    }

    /// The entitlement granted to every provisioned user, if configured.
    pub(crate) async fn base_entitlement(&self) -> BitwardenResult<Option<Entitlement>> {
        let instance = self.load_instance().await?;
        match instance.base_entitlement_id {
            Some(id) => Ok(self.platform.entitlements.get(id).await?),
            None => Ok(None),
        }
    }

    /// The entitlement assigned to newly created users, if configured.
    pub(crate) async fn default_entitlement(&self) -> BitwardenResult<Option<Entitlement>> {
        let instance = self.load_instance().await?;
        match instance.default_entitlement_id {
            Some(id) => Ok(self.platform.entitlements.get(id).await?),
            None => Ok(None),
        }
    }

    /// The identity's stored `accessAll` flag, defaulting to false when the
    /// attribute is absent or unparseable.
    pub(crate) async fn access_all_attribute(&self, identity_id: Uuid) -> BitwardenResult<bool> {
        let value = self
            .platform
            .identities
            .attribute(identity_id, self.instance_id, ACCESS_ALL_ATTRIBUTE)
            .await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Record an identity-entitlement association.
    pub(crate) async fn record_grant(
        &self,
        identity_id: Uuid,
        entitlement_id: Uuid,
        expiration: Option<DateTime<Utc>>,
        grant_type: &str,
    ) -> BitwardenResult<()> {
        self.platform
            .grants
            .grant(GrantInput {
                identity_id,
                entitlement_id,
                expiration,
                grant_type: grant_type.to_string(),
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Connector for BitwardenConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        let _: ListResponse<Member> = self.client.get_json("/public/members").await?;
        Ok(())
    }
}

#[async_trait]
impl DirectorySync for BitwardenConnector {
    async fn import_entitlements(&self) -> ConnectorResult<()> {
        Ok(BitwardenConnector::import_entitlements(self).await?)
    }

    async fn import_users(&self, actor: Uuid) -> ConnectorResult<()> {
        Ok(BitwardenConnector::import_users(self, actor).await?)
    }

    async fn import_user(&self, user: &serde_json::Value, actor: Uuid) -> ConnectorResult<()> {
        Ok(BitwardenConnector::import_user(self, user, actor).await?)
    }
}

#[async_trait]
impl Provisionable for BitwardenConnector {
    async fn add_entitlement_to_identity(
        &self,
        entitlement: &Entitlement,
        identity: &Identity,
        expiration: Option<DateTime<Utc>>,
        grant_type: &str,
    ) -> ConnectorResult<()> {
        Ok(
            BitwardenConnector::add_entitlement_to_identity(
                self,
                entitlement,
                identity,
                expiration,
                grant_type,
            )
            .await?,
        )
    }

    async fn remove_entitlement_from_identity(
        &self,
        grant: &IdentityEntitlement,
    ) -> ConnectorResult<()> {
        Ok(BitwardenConnector::remove_entitlement_from_identity(self, grant).await?)
    }

    async fn deactivate_user(&self, service_identifier: &str) -> ConnectorResult<()> {
        Ok(BitwardenConnector::deactivate_user(self, service_identifier).await?)
    }

    async fn delete_user(&self, service_identifier: &str) -> ConnectorResult<()> {
        Ok(BitwardenConnector::delete_user(self, service_identifier).await?)
    }

    async fn create_user(&self, identity: &Identity) -> ConnectorResult<String> {
        let member = BitwardenConnector::create_new_user(self, identity).await?;
        Ok(member.id)
    }
}
