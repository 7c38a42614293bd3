use async_trait::async_trait;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use crate::models::{AuditEvent, RepositoryError};

/// Append-only audit log. Entries are never updated or deleted.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditLogRepositoryTrait: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), RepositoryError>;

    async fn list_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Vec<AuditEvent>, RepositoryError>;
}

pub struct InMemoryAuditLogRepository {
    entries: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepositoryTrait for InMemoryAuditLogRepository {
    async fn append(&self, event: AuditEvent) -> Result<(), RepositoryError> {
        self.entries.lock().unwrap().push(event);
        Ok(())
    }

    async fn list_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|event| event.request_id == request_id)
            .cloned()
            .collect())
    }
}
