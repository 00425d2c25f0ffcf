//! Platform collaborator bundle.

use std::sync::Arc;

use crate::conflict::{ConflictQueue, InMemoryConflictQueue};
use crate::entitlement::{EntitlementStore, GrantStore, InMemoryEntitlementStore, InMemoryGrantStore};
use crate::identity::{IdentityStore, InMemoryIdentityStore};
use crate::instance::{InMemoryInstanceStore, InstanceStore};
use crate::jobs::{ImportQueue, InMemoryImportQueue};
use crate::notify::{LogNotifier, Notifier};

/// The platform services a connector operates against.
///
/// Connectors receive one of these at construction instead of reaching for
/// process-wide state, so a test or a worker can wire any combination of
/// backends.
#[derive(Clone)]
pub struct Platform {
    /// Head-revision entitlement storage.
    pub entitlements: Arc<dyn EntitlementStore>,
    /// Identity-entitlement association storage.
    pub grants: Arc<dyn GrantStore>,
    /// Identity lookup and per-connector identity state.
    pub identities: Arc<dyn IdentityStore>,
    /// Application instance configuration.
    pub instances: Arc<dyn InstanceStore>,
    /// Queue for unresolved import records.
    pub conflicts: Arc<dyn ConflictQueue>,
    /// User-visible notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Bulk import job queue.
    pub import_queue: Arc<dyn ImportQueue>,
}

impl Platform {
    /// Create a platform backed entirely by in-memory implementations.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            entitlements: Arc::new(InMemoryEntitlementStore::new()),
            grants: Arc::new(InMemoryGrantStore::new()),
            identities: Arc::new(InMemoryIdentityStore::new()),
            instances: Arc::new(InMemoryInstanceStore::new()),
            conflicts: Arc::new(InMemoryConflictQueue::new()),
            notifier: Arc::new(LogNotifier),
            import_queue: Arc::new(InMemoryImportQueue::new()),
        }
    }
}
