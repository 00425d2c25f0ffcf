//! Identities and per-connector identity state.
//!
//! An identity is the platform-side person record. Each connector links it
//! to the target system through a service identifier (the provider's user
//! id) and may stash named attribute values against it. The attribute store
//! is typed at this boundary; adapters over genuinely untyped backends are
//! expected to stringify on write and parse on read.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ConnectorResult;

/// A platform identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier.
    pub id: Uuid,
    /// Primary email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A boolean value.
    Boolean(bool),
}

impl AttributeValue {
    /// Interpret the value as a boolean.
    ///
    /// String values written by untyped backends are parsed: `"true"` and
    /// `"false"` (case-insensitive) map to the corresponding boolean,
    /// anything else is `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            AttributeValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }

    /// Get the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s.as_str()),
            AttributeValue::Boolean(_) => None,
        }
    }
}

/// Identity lookup and per-connector identity state.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find the identity linked to a provider user id for an application
    /// instance.
    async fn find_by_service_identifier(
        &self,
        application_id: Uuid,
        service_identifier: &str,
    ) -> ConnectorResult<Option<Identity>>;

    /// Find an identity by email address.
    async fn find_by_email(&self, email: &str) -> ConnectorResult<Option<Identity>>;

    /// Link an identity to a provider user id. Re-linking the same pair is
    /// a no-op; linking a new id replaces the previous one.
    async fn link_service_identifier(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        service_identifier: &str,
    ) -> ConnectorResult<()>;

    /// Get the provider user id linked to an identity, if any.
    async fn service_identifier(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
    ) -> ConnectorResult<Option<String>>;

    /// Set a named attribute value for an identity, scoped to an
    /// application instance.
    async fn set_attribute(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        name: &str,
        value: AttributeValue,
    ) -> ConnectorResult<()>;

    /// Get a named attribute value for an identity.
    async fn attribute(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        name: &str,
    ) -> ConnectorResult<Option<AttributeValue>>;
}

#[derive(Debug, Default)]
struct IdentityState {
    identities: HashMap<Uuid, Identity>,
    // (application_id, service_identifier) -> identity_id
    links: HashMap<(Uuid, String), Uuid>,
    // (identity_id, application_id, attribute name) -> value
    attributes: HashMap<(Uuid, Uuid, String), AttributeValue>,
}

/// In-memory identity store for testing.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    state: Arc<RwLock<IdentityState>>,
}

impl InMemoryIdentityStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity record.
    pub async fn insert(&self, identity: Identity) {
        let mut state = self.state.write().await;
        state.identities.insert(identity.id, identity);
    }
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_service_identifier(
        &self,
        application_id: Uuid,
        service_identifier: &str,
    ) -> ConnectorResult<Option<Identity>> {
        let state = self.state.read().await;
        Ok(state
            .links
            .get(&(application_id, service_identifier.to_string()))
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> ConnectorResult<Option<Identity>> {
        let state = self.state.read().await;
        Ok(state
            .identities
            .values()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn link_service_identifier(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        service_identifier: &str,
    ) -> ConnectorResult<()> {
        let mut state = self.state.write().await;
        state
            .links
            .retain(|(app, _), id| !(*app == application_id && *id == identity_id));
        state
            .links
            .insert((application_id, service_identifier.to_string()), identity_id);
        Ok(())
    }

    async fn service_identifier(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
    ) -> ConnectorResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .links
            .iter()
            .find(|((app, _), id)| *app == application_id && **id == identity_id)
            .map(|((_, sid), _)| sid.clone()))
    }

    async fn set_attribute(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        name: &str,
        value: AttributeValue,
    ) -> ConnectorResult<()> {
        let mut state = self.state.write().await;
        state
            .attributes
            .insert((identity_id, application_id, name.to_string()), value);
        Ok(())
    }

    async fn attribute(
        &self,
        identity_id: Uuid,
        application_id: Uuid,
        name: &str,
    ) -> ConnectorResult<Option<AttributeValue>> {
        let state = self.state.read().await;
        Ok(state
            .attributes
            .get(&(identity_id, application_id, name.to_string()))
            .cloned())
    }
}
