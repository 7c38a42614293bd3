use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use crate::models::{
    RepositoryError, TransactionRepoModel, TransactionStatus, TransactionUpdateRequest,
};

/// Durable-store contract for broadcast-attempt records. Records are keyed
/// by request id; at most one live record exists per request, and once a
/// hash is known the record is also reachable by it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    async fn create(
        &self,
        tx: TransactionRepoModel,
    ) -> Result<TransactionRepoModel, RepositoryError>;

    async fn get_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<TransactionRepoModel>, RepositoryError>;

    async fn get_by_hash(&self, hash: &str)
        -> Result<Option<TransactionRepoModel>, RepositoryError>;

    /// Compare-and-set partial update by hash. A record already terminal
    /// is never moved back to `Submitted` by a stale in-flight check.
    async fn update_by_hash(
        &self,
        hash: &str,
        update: TransactionUpdateRequest,
    ) -> Result<TransactionRepoModel, RepositoryError>;

    /// Every record still awaiting finality, for monitor reload at start.
    async fn list_pending(&self) -> Result<Vec<TransactionRepoModel>, RepositoryError>;
}

pub struct InMemoryTransactionRepository {
    store: Mutex<HashMap<String, TransactionRepoModel>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryTransactionRepository {
    async fn create(
        &self,
        tx: TransactionRepoModel,
    ) -> Result<TransactionRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.get(&tx.request_id) {
            if !existing.status.is_terminal() {
                return Err(RepositoryError::ConstraintViolation(format!(
                    "Request {} already has a live transaction record",
                    tx.request_id
                )));
            }
        }
        store.insert(tx.request_id.clone(), tx.clone());
        Ok(tx)
    }

    async fn get_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.get(request_id).cloned())
    }

    async fn get_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .values()
            .find(|tx| tx.tx_hash.as_deref() == Some(hash))
            .cloned())
    }

    async fn update_by_hash(
        &self,
        hash: &str,
        update: TransactionUpdateRequest,
    ) -> Result<TransactionRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let tx = store
            .values_mut()
            .find(|tx| tx.tx_hash.as_deref() == Some(hash))
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Transaction with hash {} not found", hash))
            })?;

        if let Some(status) = update.status {
            if tx.status.is_terminal() && tx.status != status {
                return Err(RepositoryError::InvalidTransition(format!(
                    "Transaction {} is already {} and cannot move to {}",
                    hash, tx.status, status
                )));
            }
            tx.status = status;
        }
        if let Some(confirmations) = update.confirmations {
            tx.confirmations = confirmations;
        }
        if let Some(block_height) = update.block_height {
            tx.block_height = Some(block_height);
        }
        if let Some(block_hash) = update.block_hash {
            tx.block_hash = Some(block_hash);
        }
        if let Some(failure_reason) = update.failure_reason {
            tx.failure_reason = Some(failure_reason);
        }
        Ok(tx.clone())
    }

    async fn list_pending(&self) -> Result<Vec<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .values()
            .filter(|tx| tx.status == TransactionStatus::Submitted && tx.tx_hash.is_some())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup_by_hash() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();

        let by_hash = repo.get_by_hash("hash-1").await.unwrap().unwrap();
        assert_eq!(by_hash.request_id, "req-1");
        assert!(repo.get_by_hash("hash-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_live_record_is_unique_per_request() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();

        let result = repo
            .create(TransactionRepoModel::submitted("req-1", "hash-2"))
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_new_record_allowed_after_terminal() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();
        repo.update_by_hash(
            "hash-1",
            TransactionUpdateRequest {
                status: Some(TransactionStatus::Failed),
                failure_reason: Some("timeout".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        repo.create(TransactionRepoModel::submitted("req-1", "hash-2"))
            .await
            .unwrap();
        let live = repo.get_by_request_id("req-1").await.unwrap().unwrap();
        assert_eq!(live.tx_hash.as_deref(), Some("hash-2"));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();

        let updated = repo
            .update_by_hash(
                "hash-1",
                TransactionUpdateRequest {
                    confirmations: Some(2),
                    block_height: Some(98),
                    block_hash: Some("block-98".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TransactionStatus::Submitted);
        assert_eq!(updated.confirmations, 2);
        assert_eq!(updated.block_height, Some(98));
    }

    #[tokio::test]
    async fn test_terminal_record_not_resubmitted() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();
        repo.update_by_hash(
            "hash-1",
            TransactionUpdateRequest {
                status: Some(TransactionStatus::Failed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let result = repo
            .update_by_hash(
                "hash-1",
                TransactionUpdateRequest {
                    status: Some(TransactionStatus::Submitted),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_list_pending_excludes_terminal() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(TransactionRepoModel::submitted("req-1", "hash-1"))
            .await
            .unwrap();
        repo.create(TransactionRepoModel::submitted("req-2", "hash-2"))
            .await
            .unwrap();
        repo.update_by_hash(
            "hash-2",
            TransactionUpdateRequest {
                status: Some(TransactionStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let pending = repo.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].tx_hash.as_deref(), Some("hash-1"));
    }
}
