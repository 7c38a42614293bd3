use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use crate::models::{RepositoryError, RequestRepoModel, RequestStatus};

/// Durable-store contract for transfer requests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RequestRepositoryTrait: Send + Sync {
    async fn create(&self, request: RequestRepoModel)
        -> Result<RequestRepoModel, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<RequestRepoModel, RepositoryError>;

    /// Compare-and-set status update. A request already in a terminal
    /// status is never moved back to a non-terminal one; a stale writer
    /// gets `InvalidTransition` instead of silently clobbering the record.
    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<RequestRepoModel, RepositoryError>;
}

pub struct InMemoryRequestRepository {
    store: Mutex<HashMap<String, RequestRepoModel>>,
}

impl InMemoryRequestRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRequestRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestRepositoryTrait for InMemoryRequestRepository {
    async fn create(
        &self,
        request: RequestRepoModel,
    ) -> Result<RequestRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&request.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Request with ID {} already exists",
                request.id
            )));
        }
        store.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn get_by_id(&self, id: &str) -> Result<RequestRepoModel, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Request with ID {} not found", id)))
    }

    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<RequestRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let request = store
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Request with ID {} not found", id)))?;

        if request.status.is_terminal() && request.status != status {
            return Err(RepositoryError::InvalidTransition(format!(
                "Request {} is already {} and cannot move to {}",
                id, request.status, status
            )));
        }

        request.status = status;
        Ok(request.clone())
    }
}
