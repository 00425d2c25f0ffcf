//! Versioned entitlement model and stores.
//!
//! Entitlements are revisioned: edits create new revisions, and exactly one
//! revision per `(application_id, resource_type, extra_params)` tuple carries
//! the `is_head_revision` flag at any time. Connectors only ever look up and
//! create head revisions; a repeated catalog import marks the head fresh
//! instead of recreating it, which is what makes imports safe to re-run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ConnectorResult;

/// An entitlement representing an access right in a connected application.
///
/// `resource_type` and `extra_params` are opaque to the platform; each
/// connector defines the shapes it writes and reads back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    /// Unique identifier of this revision.
    pub id: Uuid,
    /// The application instance this entitlement belongs to.
    pub application_id: Uuid,
    /// Display name.
    pub name: String,
    /// Connector-defined resource kind (e.g. "group").
    pub resource_type: String,
    /// Connector-defined parameters identifying the resource in the
    /// target system.
    pub extra_params: serde_json::Value,
    /// Whether this is the current live revision.
    pub is_head_revision: bool,
    /// Set when an import pass no longer sees the backing resource.
    pub stale: bool,
    /// When this revision was created.
    pub created_at: DateTime<Utc>,
    /// When an import pass last confirmed the backing resource.
    pub refreshed_at: DateTime<Utc>,
}

/// Input for creating a head-revision entitlement.
#[derive(Debug, Clone)]
pub struct CreateEntitlementInput {
    /// The application instance this entitlement belongs to.
    pub application_id: Uuid,
    /// Display name.
    pub name: String,
    /// Connector-defined resource kind.
    pub resource_type: String,
    /// Connector-defined resource parameters.
    pub extra_params: serde_json::Value,
}

/// Association between an identity and an entitlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityEntitlement {
    /// Unique identifier.
    pub id: Uuid,
    /// The identity holding the entitlement.
    pub identity_id: Uuid,
    /// The entitlement revision held.
    pub entitlement_id: Uuid,
    /// Optional expiration of the grant.
    pub expiration: Option<DateTime<Utc>>,
    /// How the grant was made (e.g. "role").
    pub grant_type: String,
    /// When the grant was recorded.
    pub granted_at: DateTime<Utc>,
}

/// Input for recording an identity entitlement.
#[derive(Debug, Clone)]
pub struct GrantInput {
    /// The identity receiving the entitlement.
    pub identity_id: Uuid,
    /// The entitlement being granted.
    pub entitlement_id: Uuid,
    /// Optional expiration of the grant.
    pub expiration: Option<DateTime<Utc>>,
    /// How the grant was made.
    pub grant_type: String,
}

/// Head-revision entitlement storage.
#[async_trait::async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Get an entitlement revision by ID.
    async fn get(&self, id: Uuid) -> ConnectorResult<Option<Entitlement>>;

    /// Find the head revision by name within an application instance.
    async fn find_head_by_name(
        &self,
        application_id: Uuid,
        name: &str,
    ) -> ConnectorResult<Option<Entitlement>>;

    /// Find the head revision matching a resource type and a subset of
    /// `extra_params` keys within an application instance.
    async fn find_head_by_resource(
        &self,
        application_id: Uuid,
        resource_type: &str,
        extra_params: &serde_json::Value,
    ) -> ConnectorResult<Option<Entitlement>>;

    /// Create a new head-revision entitlement.
    async fn create(&self, input: CreateEntitlementInput) -> ConnectorResult<Entitlement>;

    /// Mark a head revision as freshly confirmed by an import pass.
    async fn mark_fresh(&self, id: Uuid) -> ConnectorResult<()>;

    /// List head revisions for an application instance.
    async fn list_heads(&self, application_id: Uuid) -> ConnectorResult<Vec<Entitlement>>;
}

/// Identity-entitlement association storage.
#[async_trait::async_trait]
pub trait GrantStore: Send + Sync {
    /// Record a grant. Granting the same entitlement to the same identity
    /// twice updates the existing association rather than duplicating it.
    async fn grant(&self, input: GrantInput) -> ConnectorResult<IdentityEntitlement>;

    /// List grants held by an identity.
    async fn grants_for_identity(
        &self,
        identity_id: Uuid,
    ) -> ConnectorResult<Vec<IdentityEntitlement>>;

    /// Remove a grant. Returns false if it did not exist.
    async fn revoke(&self, id: Uuid) -> ConnectorResult<bool>;
}

/// In-memory entitlement store for testing.
#[derive(Debug, Default)]
pub struct InMemoryEntitlementStore {
    entitlements: Arc<RwLock<HashMap<Uuid, Entitlement>>>,
}

impl InMemoryEntitlementStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// True when every key of `wanted` is present in `actual` with an equal value.
fn extra_params_match(actual: &serde_json::Value, wanted: &serde_json::Value) -> bool {
    match (actual.as_object(), wanted.as_object()) {
        (Some(actual), Some(wanted)) => wanted.iter().all(|(k, v)| actual.get(k) == Some(v)),
        _ => actual == wanted,
    }
}

#[async_trait::async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get(&self, id: Uuid) -> ConnectorResult<Option<Entitlement>> {
        let entitlements = self.entitlements.read().await;
        Ok(entitlements.get(&id).cloned())
    }

    async fn find_head_by_name(
        &self,
        application_id: Uuid,
        name: &str,
    ) -> ConnectorResult<Option<Entitlement>> {
        let entitlements = self.entitlements.read().await;
        Ok(entitlements
            .values()
            .find(|e| e.application_id == application_id && e.is_head_revision && e.name == name)
            .cloned())
    }

    async fn find_head_by_resource(
        &self,
        application_id: Uuid,
        resource_type: &str,
        extra_params: &serde_json::Value,
    ) -> ConnectorResult<Option<Entitlement>> {
        let entitlements = self.entitlements.read().await;
        Ok(entitlements
            .values()
            .find(|e| {
                e.application_id == application_id
                    && e.is_head_revision
                    && e.resource_type == resource_type
                    && extra_params_match(&e.extra_params, extra_params)
            })
            .cloned())
    }

    async fn create(&self, input: CreateEntitlementInput) -> ConnectorResult<Entitlement> {
        let now = Utc::now();
        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            application_id: input.application_id,
            name: input.name,
            resource_type: input.resource_type,
            extra_params: input.extra_params,
            is_head_revision: true,
            stale: false,
            created_at: now,
            refreshed_at: now,
        };

        let mut entitlements = self.entitlements.write().await;
        entitlements.insert(entitlement.id, entitlement.clone());
        Ok(entitlement)
    }

    async fn mark_fresh(&self, id: Uuid) -> ConnectorResult<()> {
        let mut entitlements = self.entitlements.write().await;
        if let Some(entitlement) = entitlements.get_mut(&id) {
            entitlement.stale = false;
            entitlement.refreshed_at = Utc::now();
        }
        Ok(())
    }

    async fn list_heads(&self, application_id: Uuid) -> ConnectorResult<Vec<Entitlement>> {
        let entitlements = self.entitlements.read().await;
        let mut heads: Vec<_> = entitlements
            .values()
            .filter(|e| e.application_id == application_id && e.is_head_revision)
            .cloned()
            .collect();
        heads.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(heads)
    }
}

/// In-memory grant store for testing.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    grants: Arc<RwLock<Vec<IdentityEntitlement>>>,
}

impl InMemoryGrantStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All grants currently recorded.
    pub async fn all(&self) -> Vec<IdentityEntitlement> {
        self.grants.read().await.clone()
    }
}

#[async_trait::async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn grant(&self, input: GrantInput) -> ConnectorResult<IdentityEntitlement> {
        let mut grants = self.grants.write().await;

        if let Some(existing) = grants
            .iter_mut()
            .find(|g| g.identity_id == input.identity_id && g.entitlement_id == input.entitlement_id)
        {
            existing.expiration = input.expiration;
            existing.grant_type = input.grant_type;
            return Ok(existing.clone());
        }

        let grant = IdentityEntitlement {
            id: Uuid::new_v4(),
            identity_id: input.identity_id,
            entitlement_id: input.entitlement_id,
            expiration: input.expiration,
            grant_type: input.grant_type,
            granted_at: Utc::now(),
        };
        grants.push(grant.clone());
        Ok(grant)
    }

    async fn grants_for_identity(
        &self,
        identity_id: Uuid,
    ) -> ConnectorResult<Vec<IdentityEntitlement>> {
        let grants = self.grants.read().await;
        Ok(grants
            .iter()
            .filter(|g| g.identity_id == identity_id)
            .cloned()
            .collect())
    }

    async fn revoke(&self, id: Uuid) -> ConnectorResult<bool> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|g| g.id != id);
        Ok(grants.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_input(application_id: Uuid, name: &str, group_id: &str) -> CreateEntitlementInput {
        CreateEntitlementInput {
            application_id,
            name: name.to_string(),
            resource_type: "group".to_string(),
            extra_params: json!({ "id": group_id }),
        }
    }

    #[tokio::test]
    async fn test_find_head_by_name() {
        let store = InMemoryEntitlementStore::new();
        let app = Uuid::new_v4();

        store.create(group_input(app, "Engineering", "g1")).await.unwrap();

        let found = store.find_head_by_name(app, "Engineering").await.unwrap();
        assert!(found.is_some());
        assert!(store
            .find_head_by_name(Uuid::new_v4(), "Engineering")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_head_by_resource_matches_param_subset() {
        let store = InMemoryEntitlementStore::new();
        let app = Uuid::new_v4();

        let created = store.create(group_input(app, "Engineering", "g1")).await.unwrap();

        let found = store
            .find_head_by_resource(app, "group", &json!({ "id": "g1" }))
            .await
            .unwrap()
            .expect("head should match on extra_params subset");
        assert_eq!(found.id, created.id);

        assert!(store
            .find_head_by_resource(app, "group", &json!({ "id": "g2" }))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_head_by_resource(app, "type", &json!({ "id": "g1" }))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mark_fresh_updates_refreshed_at() {
        let store = InMemoryEntitlementStore::new();
        let app = Uuid::new_v4();

        let created = store.create(group_input(app, "Engineering", "g1")).await.unwrap();
        store.mark_fresh(created.id).await.unwrap();

        let reloaded = store.get(created.id).await.unwrap().unwrap();
        assert!(!reloaded.stale);
        assert!(reloaded.refreshed_at >= created.refreshed_at);
    }

    #[tokio::test]
    async fn test_grant_is_idempotent_per_identity_and_entitlement() {
        let store = InMemoryGrantStore::new();
        let identity_id = Uuid::new_v4();
        let entitlement_id = Uuid::new_v4();

        let input = GrantInput {
            identity_id,
            entitlement_id,
            expiration: None,
            grant_type: "role".to_string(),
        };
        let first = store.grant(input.clone()).await.unwrap();
        let second = store.grant(input).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.grants_for_identity(identity_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = InMemoryGrantStore::new();
        let grant = store
            .grant(GrantInput {
                identity_id: Uuid::new_v4(),
                entitlement_id: Uuid::new_v4(),
                expiration: None,
                grant_type: "role".to_string(),
            })
            .await
            .unwrap();

        assert!(store.revoke(grant.id).await.unwrap());
        assert!(!store.revoke(grant.id).await.unwrap());
    }
}
