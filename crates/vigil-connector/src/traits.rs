//! Connector capability traits.
//!
//! The platform dispatches to connectors through these traits: every
//! connector implements [`Connector`]; directory-style systems additionally
//! implement [`DirectorySync`] for bulk reconciliation and [`Provisionable`]
//! for administrator-driven grant and revoke operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entitlement::{Entitlement, IdentityEntitlement};
use crate::error::ConnectorResult;
use crate::identity::Identity;

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the target system.
    ///
    /// Returns `Ok(())` if the connection is successful, or an error
    /// describing what went wrong.
    async fn test_connection(&self) -> ConnectorResult<()>;
}

/// Capability for pulling the target system's directory into the platform.
///
/// Import operations read target-system state; they never push. They must
/// be safe to re-run: a second pass over unchanged provider data refreshes
/// existing records instead of duplicating them.
#[async_trait]
pub trait DirectorySync: Connector {
    /// Discover the target system's permission concepts and materialize
    /// them as head-revision entitlements.
    async fn import_entitlements(&self) -> ConnectorResult<()>;

    /// Fetch the target system's member list and queue it for per-record
    /// import.
    async fn import_users(&self, actor: Uuid) -> ConnectorResult<()>;

    /// Import a single raw member record, resolving it to a platform
    /// identity or queueing a conflict.
    async fn import_user(&self, user: &serde_json::Value, actor: Uuid) -> ConnectorResult<()>;
}

/// Capability for administrator-driven provisioning operations.
#[async_trait]
pub trait Provisionable: Connector {
    /// Grant an entitlement to an identity, pushing the change to the
    /// target system and recording the association on success.
    async fn add_entitlement_to_identity(
        &self,
        entitlement: &Entitlement,
        identity: &Identity,
        expiration: Option<DateTime<Utc>>,
        grant_type: &str,
    ) -> ConnectorResult<()>;

    /// Revoke a granted entitlement, pushing the change to the target
    /// system and removing the association on success.
    async fn remove_entitlement_from_identity(
        &self,
        grant: &IdentityEntitlement,
    ) -> ConnectorResult<()>;

    /// Deactivate the target-system account. Connectors whose target has
    /// no deactivation primitive implement this as a no-op.
    async fn deactivate_user(&self, service_identifier: &str) -> ConnectorResult<()>;

    /// Delete the target-system account.
    async fn delete_user(&self, service_identifier: &str) -> ConnectorResult<()>;

    /// Create a target-system account for an identity.
    ///
    /// Returns the new account's service identifier.
    async fn create_user(&self, identity: &Identity) -> ConnectorResult<String>;
}
