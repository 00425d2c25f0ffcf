//! Import conflict queue.
//!
//! When a sync pass cannot match a target-system account to a platform
//! identity, the record is queued for manual reconciliation instead of
//! failing the import. The raw provider payload travels with the conflict
//! so an administrator sees exactly what the provider returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ConnectorResult;

/// An unresolved account discovered during import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConflict {
    /// The application instance the account belongs to.
    pub application_id: Uuid,
    /// The provider's user id.
    pub service_identifier: String,
    /// The provider account's email address, if any.
    pub email: Option<String>,
    /// The raw provider record.
    pub payload: serde_json::Value,
    /// Who triggered the import.
    pub actor: Uuid,
    /// When the conflict was recorded.
    pub created_at: DateTime<Utc>,
}

/// Queue of import conflicts awaiting manual resolution.
#[async_trait::async_trait]
pub trait ConflictQueue: Send + Sync {
    /// Enqueue a conflict.
    async fn enqueue(&self, conflict: ImportConflict) -> ConnectorResult<()>;
}

/// In-memory conflict queue for testing.
#[derive(Debug, Default)]
pub struct InMemoryConflictQueue {
    entries: Arc<RwLock<Vec<ImportConflict>>>,
}

impl InMemoryConflictQueue {
    /// Create a new in-memory queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All conflicts recorded so far.
    pub async fn entries(&self) -> Vec<ImportConflict> {
        self.entries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ConflictQueue for InMemoryConflictQueue {
    async fn enqueue(&self, conflict: ImportConflict) -> ConnectorResult<()> {
        self.entries.write().await.push(conflict);
        Ok(())
    }
}
