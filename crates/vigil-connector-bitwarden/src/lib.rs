//! Bitwarden Organization Connector for Vigil
//!
//! This crate implements the vigil-connector traits for the Bitwarden
//! public API, reconciling an organization's membership and permission
//! model with the platform's entitlement store.
//!
//! # Features
//!
//! - `OAuth2` client credentials authentication with a store-backed,
//!   self-refreshing token cache shared per application instance
//! - Entitlement catalog import: organization groups plus the fixed
//!   member-role taxonomy, idempotent across re-runs
//! - User import with identity resolution and conflict queueing
//! - Outbound provisioning (grant/revoke entitlements, create/delete
//!   members)
//!
//! # Example
//!
//! ```no_run
//! use uuid::Uuid;
//! use vigil_connector::platform::Platform;
//! use vigil_connector::traits::Connector;
//! use vigil_connector_bitwarden::{BitwardenConfig, BitwardenConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Platform::in_memory();
//! let connector = BitwardenConnector::new(
//!     BitwardenConfig::default(),
//!     Uuid::new_v4(),
//!     platform,
//! )?;
//! connector.test_connection().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod catalog;
mod client;
mod config;
mod connector;
mod error;
mod model;
mod provisioning;
mod sync;

// Re-exports
pub use auth::TokenCache;
pub use client::BitwardenClient;
pub use config::{
    BitwardenConfig, DEFAULT_API_URL, DEFAULT_TOKEN_URL, OAUTH_GRANT_TYPE, OAUTH_SCOPE,
};
pub use connector::BitwardenConnector;
pub use error::{BitwardenError, BitwardenResult};
pub use model::{
    CreateMember, EntitlementResource, Group, GroupIdsUpdate, ListResponse, Member,
    MemberIdsUpdate, MemberRole, MemberUpdate, TokenResponse, ACCESS_ALL_ATTRIBUTE,
    GRANT_TYPE_ROLE, RESOURCE_GROUP, RESOURCE_TYPE, STATUS_ACTIVE, STATUS_INVITED,
};
