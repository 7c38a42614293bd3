use std::sync::Arc;

use crate::{
    domain::{BatchSubmissionManager, ConfirmationMonitor, SubmissionQueue, SubmissionTracker},
    repositories::{
        InMemoryAuditLogRepository, InMemoryRequestRepository, InMemoryTransactionRepository,
    },
    services::{HttpLedgerGateway, WebhookNotificationService},
};

/// Explicit long-lived services constructed once at process start and
/// injected into the HTTP layer. Nothing in the pipeline reaches for
/// ambient singletons.
pub struct AppState<G, R, T, A, N> {
    pub tracker: Arc<SubmissionTracker<G, R, T, A, N>>,
    pub queue: Arc<SubmissionQueue>,
    pub batch_manager: Arc<BatchSubmissionManager<G, R, T, A, N>>,
    pub monitor: Arc<ConfirmationMonitor<G, R, T, A, N>>,
    pub request_repository: Arc<R>,
    pub transaction_repository: Arc<T>,
    pub audit_log: Arc<A>,
}

impl<G, R, T, A, N> Clone for AppState<G, R, T, A, N> {
    fn clone(&self) -> Self {
        Self {
            tracker: Arc::clone(&self.tracker),
            queue: Arc::clone(&self.queue),
            batch_manager: Arc::clone(&self.batch_manager),
            monitor: Arc::clone(&self.monitor),
            request_repository: Arc::clone(&self.request_repository),
            transaction_repository: Arc::clone(&self.transaction_repository),
            audit_log: Arc::clone(&self.audit_log),
        }
    }
}

pub type DefaultAppState = AppState<
    HttpLedgerGateway,
    InMemoryRequestRepository,
    InMemoryTransactionRepository,
    InMemoryAuditLogRepository,
    WebhookNotificationService,
>;
