//! Application instance configuration.
//!
//! An application instance is one connected tenant of a target system: it
//! carries the credentials the connector authenticates with, the cached
//! access token, and the entitlements the provisioning workflow falls back
//! to when it needs a role to assign.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ConnectorResult;

/// OAuth client credentials for one application instance.
#[derive(Debug, Clone)]
pub struct InstanceCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
}

/// A cached access token with its absolute expiration.
///
/// The record is overwritten wholesale on every refresh; there is no
/// partial update and no explicit deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The opaque access token.
    pub access_token: String,
    /// Absolute expiration timestamp.
    pub expiration: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the token has reached its expiration.
    pub fn is_expired(&self) -> bool {
        self.expiration <= Utc::now()
    }
}

/// Configuration record for one connected application instance.
#[derive(Debug, Clone)]
pub struct ApplicationInstance {
    /// Unique identifier; entitlements reference it as `application_id`.
    pub id: Uuid,
    /// Display name shown to administrators.
    pub display_name: String,
    /// Credentials for the target system.
    pub credentials: InstanceCredentials,
    /// Cached access token, absent until the first authenticated call.
    pub access_token: Option<TokenRecord>,
    /// Entitlement granted to every provisioned user.
    pub base_entitlement_id: Option<Uuid>,
    /// Entitlement whose role is assigned when creating new users.
    pub default_entitlement_id: Option<Uuid>,
}

/// Application instance configuration storage.
#[async_trait::async_trait]
pub trait InstanceStore: Send + Sync {
    /// Load an instance configuration record.
    async fn load(&self, id: Uuid) -> ConnectorResult<Option<ApplicationInstance>>;

    /// Persist a refreshed token record for an instance.
    async fn save_token(&self, id: Uuid, token: TokenRecord) -> ConnectorResult<()>;
}

/// In-memory instance store for testing.
#[derive(Debug, Default)]
pub struct InMemoryInstanceStore {
    instances: Arc<RwLock<HashMap<Uuid, ApplicationInstance>>>,
}

impl InMemoryInstanceStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an instance record.
    pub async fn insert(&self, instance: ApplicationInstance) {
        let mut instances = self.instances.write().await;
        instances.insert(instance.id, instance);
    }
}

#[async_trait::async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn load(&self, id: Uuid) -> ConnectorResult<Option<ApplicationInstance>> {
        let instances = self.instances.read().await;
        Ok(instances.get(&id).cloned())
    }

    async fn save_token(&self, id: Uuid, token: TokenRecord) -> ConnectorResult<()> {
        let mut instances = self.instances.write().await;
        if let Some(instance) = instances.get_mut(&id) {
            instance.access_token = Some(token);
        }
        Ok(())
    }
}
