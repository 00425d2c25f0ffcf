//! # Connector Framework
//!
//! Core abstractions for connecting Vigil to external identity systems.
//!
//! This crate provides the platform-side surface a connector builds on:
//! the versioned entitlement model, identity linkage and attributes,
//! per-instance configuration with token caching, the conflict queue for
//! unresolved imports, and the capability traits the provisioning and sync
//! workflows dispatch through.
//!
//! ## Architecture
//!
//! - [`traits::Connector`] - base trait all connectors implement
//! - [`traits::DirectorySync`] - bulk entitlement/user reconciliation
//! - [`traits::Provisionable`] - administrator-driven grant/revoke
//!
//! Collaborators are injected through the [`platform::Platform`] bundle;
//! every store trait ships an in-memory implementation so connector test
//! suites run without a database.
//!
//! ## Crate Organization
//!
//! - [`error`] - error types with transient/permanent classification
//! - [`entitlement`] - head-revision entitlements and grants
//! - [`identity`] - identities, service identifiers, typed attributes
//! - [`instance`] - application instance configuration and token records
//! - [`conflict`] - manual-reconciliation queue
//! - [`jobs`] - bulk import dispatch
//! - [`notify`] - toast/alert delivery
//! - [`traits`] - connector capability traits

pub mod conflict;
pub mod entitlement;
pub mod error;
pub mod identity;
pub mod instance;
pub mod jobs;
pub mod notify;
pub mod platform;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use vigil_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::conflict::{ConflictQueue, ImportConflict};
    pub use crate::entitlement::{
        CreateEntitlementInput, Entitlement, EntitlementStore, GrantInput, GrantStore,
        IdentityEntitlement,
    };
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::identity::{AttributeValue, Identity, IdentityStore};
    pub use crate::instance::{
        ApplicationInstance, InstanceCredentials, InstanceStore, TokenRecord,
    };
    pub use crate::jobs::ImportQueue;
    pub use crate::notify::{Notifier, Severity};
    pub use crate::platform::Platform;
    pub use crate::traits::{Connector, DirectorySync, Provisionable};
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
