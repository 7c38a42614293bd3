//! Confirmation monitor.
//!
//! Background polling loop that tracks every transaction broadcast but not
//! yet final. Per monitored transaction the state machine is
//! `SUBMITTED -> CONFIRMED` or `SUBMITTED -> FAILED`; once terminal a
//! transaction never comes back. Durable state is the source of truth: on
//! start the monitor reloads every still-pending record from the store, and
//! shutdown leaves the in-memory set intact for the next start.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::config::{MonitorConfig, MonitorConfigUpdate};
use crate::models::{
    produce_status_change_notification, AuditEvent, AuditEventKind, GatewayError, MonitorError,
    RepositoryError, RequestStatus, TransactionStatus, TransactionUpdateRequest,
};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender, TransactionInfo};

/// In-memory tracking state for one broadcast transaction.
#[derive(Debug, Clone)]
pub struct MonitoredTransaction {
    pub tx_hash: String,
    pub request_id: String,
    pub submitted_at: DateTime<Utc>,
    pub last_confirmations: u64,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    pub check_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MonitorStats {
    pub monitored_count: usize,
    pub cycles_completed: u64,
    pub total_confirmed: u64,
    pub total_failed: u64,
    pub is_running: bool,
}

pub struct ConfirmationMonitor<G, R, T, A, N> {
    gateway: Arc<G>,
    request_repository: Arc<R>,
    transaction_repository: Arc<T>,
    audit_log: Arc<A>,
    notifier: Arc<N>,
    config: Mutex<MonitorConfig>,
    monitored: Mutex<HashMap<String, MonitoredTransaction>>,
    shutdown: watch::Sender<bool>,
    running: AtomicBool,
    cycles_completed: AtomicU64,
    total_confirmed: AtomicU64,
    total_failed: AtomicU64,
}

impl<G, R, T, A, N> ConfirmationMonitor<G, R, T, A, N>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        request_repository: Arc<R>,
        transaction_repository: Arc<T>,
        audit_log: Arc<A>,
        notifier: Arc<N>,
        config: MonitorConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            gateway,
            request_repository,
            transaction_repository,
            audit_log,
            notifier,
            config: Mutex::new(config),
            monitored: Mutex::new(HashMap::new()),
            shutdown,
            running: AtomicBool::new(false),
            cycles_completed: AtomicU64::new(0),
            total_confirmed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }

    /// Reloads every store record still awaiting finality into the
    /// monitored set. Records already present keep their in-memory
    /// counters.
    pub async fn reload_pending(&self) -> Result<usize, RepositoryError> {
        let pending = self.transaction_repository.list_pending().await?;
        let mut loaded = 0;
        let mut monitored = self.monitored.lock();
        for tx in pending {
            let Some(hash) = tx.tx_hash.clone() else {
                continue;
            };
            if monitored.contains_key(&hash) {
                continue;
            }
            let submitted_at = DateTime::parse_from_rfc3339(&tx.submitted_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            monitored.insert(
                hash.clone(),
                MonitoredTransaction {
                    tx_hash: hash,
                    request_id: tx.request_id,
                    submitted_at,
                    last_confirmations: tx.confirmations,
                    block_height: tx.block_height,
                    block_hash: tx.block_hash,
                    check_attempts: 0,
                },
            );
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Starts the periodic polling task. Idempotent while running.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.send_replace(false);

        match self.reload_pending().await {
            Ok(loaded) if loaded > 0 => {
                info!("confirmation monitor reloaded {} pending transactions", loaded)
            }
            Ok(_) => {}
            Err(e) => error!("confirmation monitor failed to reload pending state: {}", e),
        }

        let monitor = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            info!("confirmation monitor started");
            loop {
                let interval_secs = monitor.config.lock().check_interval_secs;
                tokio::select! {
                    _ = sleep(Duration::from_secs(interval_secs)) => {
                        monitor.run_check_cycle().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            monitor.running.store(false, Ordering::SeqCst);
            info!("confirmation monitor stopped");
        });
    }

    /// Stops the periodic task. The monitored set is left intact; durable
    /// state is reloaded on the next start anyway.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// One full monitoring pass. Public so tests and the force-check
    /// endpoint can single-step ticks deterministically.
    pub async fn run_check_cycle(&self) {
        let (batch_size, batch_pause_ms, max_confirmation_time_secs) = {
            let config = self.config.lock();
            (
                config.batch_size.max(1),
                config.batch_pause_ms,
                config.max_confirmation_time_secs,
            )
        };

        let snapshot: Vec<MonitoredTransaction> =
            self.monitored.lock().values().cloned().collect();
        if snapshot.is_empty() {
            self.cycles_completed.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Timeout rule first; timed-out transactions get no check this
        // cycle.
        let now = Utc::now();
        let mut due = Vec::new();
        for entry in snapshot {
            if (now - entry.submitted_at).num_seconds() > max_confirmation_time_secs {
                self.mark_failed(
                    &entry.tx_hash,
                    "timeout: transaction exceeded maximum confirmation time",
                )
                .await;
            } else {
                due.push(entry.tx_hash);
            }
        }
        if due.is_empty() {
            self.cycles_completed.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // One tip fetch per cycle; every depth computation below shares it.
        let tip = match self.gateway.get_current_tip_height().await {
            Ok(tip) => tip,
            Err(e) => {
                warn!("confirmation monitor could not fetch chain tip: {}", e);
                for hash in &due {
                    self.record_check_failure(hash, &e).await;
                }
                self.cycles_completed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        for (index, batch) in due.chunks(batch_size).enumerate() {
            if index > 0 {
                sleep(Duration::from_millis(batch_pause_ms)).await;
            }
            join_all(batch.iter().map(|hash| self.check_transaction(hash, tip))).await;
        }
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Registers a freshly broadcast transaction and performs one
    /// synchronous first check so an already-included transaction is not
    /// stuck waiting for the next tick.
    pub async fn add_transaction(
        &self,
        tx_hash: &str,
        request_id: &str,
        submitted_at: DateTime<Utc>,
    ) {
        self.monitored.lock().insert(
            tx_hash.to_string(),
            MonitoredTransaction {
                tx_hash: tx_hash.to_string(),
                request_id: request_id.to_string(),
                submitted_at,
                last_confirmations: 0,
                block_height: None,
                block_hash: None,
                check_attempts: 0,
            },
        );
        debug!("monitoring transaction {} for request {}", tx_hash, request_id);

        match self.gateway.get_current_tip_height().await {
            Ok(tip) => self.check_transaction(tx_hash, tip).await,
            Err(e) => self.record_check_failure(tx_hash, &e).await,
        }
    }

    /// Drops a transaction from the monitored set without touching durable
    /// state. Returns whether it was present.
    pub fn remove_transaction(&self, tx_hash: &str) -> bool {
        self.monitored.lock().remove(tx_hash).is_some()
    }

    /// Manually triggered check outside the periodic schedule.
    pub async fn force_check_transaction(&self, tx_hash: &str) -> Result<(), MonitorError> {
        if !self.monitored.lock().contains_key(tx_hash) {
            return Err(MonitorError::UnknownTransaction(tx_hash.to_string()));
        }
        let tip = self.gateway.get_current_tip_height().await?;
        self.check_transaction(tx_hash, tip).await;
        Ok(())
    }

    pub fn get_stats(&self) -> MonitorStats {
        MonitorStats {
            monitored_count: self.monitored.lock().len(),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            total_confirmed: self.total_confirmed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            is_running: self.running.load(Ordering::SeqCst),
        }
    }

    pub fn update_config(&self, update: MonitorConfigUpdate) {
        self.config.lock().apply(update);
    }

    async fn check_transaction(&self, tx_hash: &str, tip: u64) {
        let Some(entry) = self.monitored.lock().get(tx_hash).cloned() else {
            return;
        };
        let (required_confirmations, not_found_grace_secs) = {
            let config = self.config.lock();
            (config.required_confirmations, config.not_found_grace_secs)
        };

        match self.gateway.get_transaction_info(tx_hash).await {
            Err(e) => self.record_check_failure(tx_hash, &e).await,
            Ok(None) => {
                let waited = (Utc::now() - entry.submitted_at).num_seconds();
                if waited > not_found_grace_secs {
                    self.mark_failed(
                        tx_hash,
                        &format!(
                            "transaction not found on-chain after grace period ({}s)",
                            not_found_grace_secs
                        ),
                    )
                    .await;
                } else {
                    debug!(
                        "transaction {} not yet on-chain ({}s since submission)",
                        tx_hash, waited
                    );
                }
            }
            Ok(Some(info)) => {
                let confirmations = tip.saturating_sub(info.block_height) + 1;
                if confirmations >= required_confirmations {
                    self.mark_confirmed(tx_hash, &info, confirmations).await;
                } else {
                    self.record_progress(tx_hash, &entry, &info, confirmations).await;
                }
            }
        }
    }

    /// Below-threshold sighting: update in-memory and stored confirmation
    /// counts and emit a progress notification.
    async fn record_progress(
        &self,
        tx_hash: &str,
        entry: &MonitoredTransaction,
        info: &TransactionInfo,
        confirmations: u64,
    ) {
        {
            let mut monitored = self.monitored.lock();
            if let Some(tracked) = monitored.get_mut(tx_hash) {
                tracked.last_confirmations = confirmations;
                tracked.block_height = Some(info.block_height);
                tracked.block_hash = Some(info.block_hash.clone());
                tracked.check_attempts = 0;
            }
        }

        let update = TransactionUpdateRequest {
            confirmations: Some(confirmations),
            block_height: Some(info.block_height),
            block_hash: Some(info.block_hash.clone()),
            ..Default::default()
        };
        if let Err(e) = self.transaction_repository.update_by_hash(tx_hash, update).await {
            warn!("failed to persist confirmation progress for {}: {}", tx_hash, e);
            return;
        }

        let notification = produce_status_change_notification(
            &entry.request_id,
            &TransactionStatus::Submitted.to_string(),
            Some(tx_hash.to_string()),
            Some(confirmations),
            None,
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("progress notification for {} not delivered: {}", tx_hash, e);
        }
    }

    async fn record_check_failure(&self, tx_hash: &str, error: &GatewayError) {
        let (attempts, ceiling) = {
            let ceiling = self.config.lock().max_check_failures;
            let mut monitored = self.monitored.lock();
            let Some(entry) = monitored.get_mut(tx_hash) else {
                return;
            };
            entry.check_attempts += 1;
            (entry.check_attempts, ceiling)
        };
        warn!(
            "status check {} for transaction {} failed: {}",
            attempts, tx_hash, error
        );

        if attempts > ceiling {
            self.mark_failed(
                tx_hash,
                &format!("too many check failures ({} checks errored)", attempts),
            )
            .await;
        }
    }

    /// Terminal success. Persists first; only a successful compare-and-set
    /// wins the right to audit and notify, so the transition happens
    /// exactly once even under racing checks.
    async fn mark_confirmed(&self, tx_hash: &str, info: &TransactionInfo, confirmations: u64) {
        let Some(entry) = self.monitored.lock().get(tx_hash).cloned() else {
            return;
        };

        let update = TransactionUpdateRequest {
            status: Some(TransactionStatus::Confirmed),
            confirmations: Some(confirmations),
            block_height: Some(info.block_height),
            block_hash: Some(info.block_hash.clone()),
            ..Default::default()
        };
        match self.transaction_repository.update_by_hash(tx_hash, update).await {
            Ok(_) => {}
            Err(RepositoryError::InvalidTransition(_)) => {
                // Someone else already finalized it; just stop tracking.
                self.monitored.lock().remove(tx_hash);
                return;
            }
            Err(e) => {
                error!("failed to persist confirmation of {}: {}", tx_hash, e);
                return;
            }
        }

        if let Err(e) = self
            .request_repository
            .update_status(&entry.request_id, RequestStatus::Confirmed)
            .await
        {
            warn!(
                "request {} status not updated on confirmation: {}",
                entry.request_id, e
            );
        }

        if let Err(e) = self
            .audit_log
            .append(AuditEvent::new(
                AuditEventKind::TransactionConfirmed,
                &entry.request_id,
                Some(tx_hash.to_string()),
                format!(
                    "confirmed at depth {} in block {} (height {})",
                    confirmations, info.block_hash, info.block_height
                ),
            ))
            .await
        {
            warn!("audit entry for confirmation of {} not appended: {}", tx_hash, e);
        }

        self.monitored.lock().remove(tx_hash);
        self.total_confirmed.fetch_add(1, Ordering::Relaxed);
        info!(
            "transaction {} confirmed at depth {} (request {})",
            tx_hash, confirmations, entry.request_id
        );

        let notification = produce_status_change_notification(
            &entry.request_id,
            &RequestStatus::Confirmed.to_string(),
            Some(tx_hash.to_string()),
            Some(confirmations),
            None,
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("confirmation notification for {} not delivered: {}", tx_hash, e);
        }
    }

    /// Terminal failure, with a human-readable reason that lands in the
    /// record, the audit log and the notification alike.
    async fn mark_failed(&self, tx_hash: &str, reason: &str) {
        let Some(entry) = self.monitored.lock().get(tx_hash).cloned() else {
            return;
        };

        let update = TransactionUpdateRequest {
            status: Some(TransactionStatus::Failed),
            failure_reason: Some(reason.to_string()),
            ..Default::default()
        };
        match self.transaction_repository.update_by_hash(tx_hash, update).await {
            Ok(_) => {}
            Err(RepositoryError::InvalidTransition(_)) => {
                self.monitored.lock().remove(tx_hash);
                return;
            }
            Err(e) => {
                error!("failed to persist failure of {}: {}", tx_hash, e);
                return;
            }
        }

        if let Err(e) = self
            .request_repository
            .update_status(&entry.request_id, RequestStatus::Failed)
            .await
        {
            warn!(
                "request {} status not updated on failure: {}",
                entry.request_id, e
            );
        }

        if let Err(e) = self
            .audit_log
            .append(AuditEvent::new(
                AuditEventKind::TransactionFailed,
                &entry.request_id,
                Some(tx_hash.to_string()),
                reason,
            ))
            .await
        {
            warn!("audit entry for failure of {} not appended: {}", tx_hash, e);
        }

        self.monitored.lock().remove(tx_hash);
        self.total_failed.fetch_add(1, Ordering::Relaxed);
        warn!(
            "transaction {} failed: {} (request {})",
            tx_hash, reason, entry.request_id
        );

        let notification = produce_status_change_notification(
            &entry.request_id,
            &RequestStatus::Failed.to_string(),
            Some(tx_hash.to_string()),
            None,
            Some(reason.to_string()),
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("failure notification for {} not delivered: {}", tx_hash, e);
        }
    }
}
