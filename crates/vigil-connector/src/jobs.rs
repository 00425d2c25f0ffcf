//! Batch job dispatch.
//!
//! Bulk imports hand the fetched records to the platform's job queue; a
//! worker then feeds them back to the connector one at a time. Payloads are
//! raw provider JSON so the queue stays connector-agnostic.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ConnectorResult;

/// A batch of user records queued for import.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// The application instance the records belong to.
    pub application_id: Uuid,
    /// Raw provider records.
    pub users: Vec<serde_json::Value>,
    /// Who triggered the import.
    pub actor: Uuid,
}

/// Queue for bulk user imports.
#[async_trait::async_trait]
pub trait ImportQueue: Send + Sync {
    /// Enqueue a batch of raw user records for per-record import.
    async fn enqueue_user_imports(
        &self,
        application_id: Uuid,
        users: Vec<serde_json::Value>,
        actor: Uuid,
    ) -> ConnectorResult<()>;
}

/// In-memory import queue for testing.
#[derive(Debug, Default)]
pub struct InMemoryImportQueue {
    batches: Arc<RwLock<Vec<ImportBatch>>>,
}

impl InMemoryImportQueue {
    /// Create a new in-memory queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches enqueued so far.
    pub async fn batches(&self) -> Vec<ImportBatch> {
        self.batches.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ImportQueue for InMemoryImportQueue {
    async fn enqueue_user_imports(
        &self,
        application_id: Uuid,
        users: Vec<serde_json::Value>,
        actor: Uuid,
    ) -> ConnectorResult<()> {
        self.batches.write().await.push(ImportBatch {
            application_id,
            users,
            actor,
        });
        Ok(())
    }
}
