//! Submission tracker.
//!
//! Owns the only piece of mutable shared state in the pipeline: the map of
//! submissions currently being attempted. The map's check-and-claim is
//! indivisible, which is what guarantees at most one active submission per
//! request id within this process. Durable idempotency is enforced
//! separately by consulting the transaction record before broadcasting.
//!
//! Cancellation is cooperative: an in-flight gateway call is not aborted,
//! but its result is discarded on arrival and no scheduled retry survives
//! a cancel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::SubmissionConfig;
use crate::constants::FORCE_OVERRIDE_WAIT_MS;
use crate::models::{
    produce_status_change_notification, AuditEvent, AuditEventKind, GatewayError,
    RepositoryError, RequestRepoModel, RequestStatus, SubmissionError, SubmissionErrorKind,
    SubmissionMode, SubmissionOptions, SubmissionOutcome, SubmissionStatus, TrackerStats,
    TransactionRepoModel, TransactionStatus,
};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

use super::ConfirmationMonitor;

struct ActiveSubmission {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

struct ScheduledRetry {
    /// Identity token shared with the timer task, so a fired timer only
    /// deregisters (and submits for) its own registration, never a newer
    /// one armed in the interim.
    token: Arc<()>,
    handle: JoinHandle<()>,
}

pub struct SubmissionTracker<G, R, T, A, N> {
    gateway: Arc<G>,
    request_repository: Arc<R>,
    transaction_repository: Arc<T>,
    audit_log: Arc<A>,
    notifier: Arc<N>,
    monitor: Arc<ConfirmationMonitor<G, R, T, A, N>>,
    config: SubmissionConfig,
    active: Mutex<HashMap<String, ActiveSubmission>>,
    scheduled: Mutex<HashMap<String, ScheduledRetry>>,
    total_submitted: AtomicU64,
    total_failed: AtomicU64,
    total_cancelled: AtomicU64,
}

impl<G, R, T, A, N> SubmissionTracker<G, R, T, A, N>
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
        monitor: Arc<ConfirmationMonitor<G, R, T, A, N>>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            gateway,
            request_repository,
            transaction_repository,
            audit_log,
            notifier,
            monitor,
            config,
            active: Mutex::new(HashMap::new()),
            scheduled: Mutex::new(HashMap::new()),
            total_submitted: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            total_cancelled: AtomicU64::new(0),
        }
    }

    /// Attempts to broadcast the pre-signed transaction for a request.
    ///
    /// Precondition: no active submission exists for the id, unless
    /// `options.force` is set, in which case the prior attempt is cancelled
    /// and waited out first. Gateway failures come back folded into the
    /// outcome; only precondition and store failures surface as `Err`.
    pub async fn submit(
        self: &Arc<Self>,
        request_id: &str,
        options: SubmissionOptions,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        if options.force {
            self.cancel_for_override(request_id).await;
        }

        let (cancelled, finished) = {
            let mut active = self.active.lock();
            if active.contains_key(request_id) {
                return Err(SubmissionError::AlreadyInProgress(request_id.to_string()));
            }
            let cancelled = Arc::new(AtomicBool::new(false));
            let finished = Arc::new(AtomicBool::new(false));
            active.insert(
                request_id.to_string(),
                ActiveSubmission {
                    cancelled: Arc::clone(&cancelled),
                    finished: Arc::clone(&finished),
                },
            );
            (cancelled, finished)
        };

        // An explicit submit supersedes any pending delayed retry.
        self.abort_scheduled_retry(request_id);

        let result = self.submit_inner(request_id, &options, &cancelled).await;
        finished.store(true, Ordering::SeqCst);
        {
            let mut active = self.active.lock();
            // Only clear our own claim; a forced override may already have
            // replaced it with a successor's.
            if let Some(entry) = active.get(request_id) {
                if Arc::ptr_eq(&entry.cancelled, &cancelled) {
                    active.remove(request_id);
                }
            }
        }
        result
    }

    async fn submit_inner(
        self: &Arc<Self>,
        request_id: &str,
        options: &SubmissionOptions,
        cancelled: &Arc<AtomicBool>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let request = match self.request_repository.get_by_id(request_id).await {
            Ok(request) => request,
            Err(RepositoryError::NotFound(_)) => {
                return Err(SubmissionError::RequestNotFound(request_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if request.status != RequestStatus::Signed {
            return Err(SubmissionError::InvalidState(
                request_id.to_string(),
                request.status.to_string(),
            ));
        }

        // Durable idempotency: a live broadcast on record means this id has
        // already gone out, whatever this process remembers.
        if let Some(tx) = self
            .transaction_repository
            .get_by_request_id(request_id)
            .await?
        {
            if tx.status != TransactionStatus::Failed {
                return Err(SubmissionError::AlreadyBroadcast(request_id.to_string()));
            }
        }

        let signed_tx = request.signed_tx.clone().ok_or_else(|| {
            SubmissionError::InvalidState(
                request_id.to_string(),
                "signed transaction body missing".to_string(),
            )
        })?;

        // Broadcasting past the TTL slot cannot succeed; expire up front
        // when the tip is known. A tip fetch failure just skips the check
        // and lets the attempt classify the rejection.
        if let Ok(tip) = self.gateway.get_current_tip_height().await {
            if cancelled.load(Ordering::SeqCst) {
                return Ok(SubmissionOutcome::cancelled(0, options.mode));
            }
            if request.ttl_slot < tip {
                return self.expire_request(&request, tip, options.mode).await;
            }
        }

        let max_attempts = options.max_attempts.unwrap_or(self.config.max_attempts).max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(
                "submitting transaction for request {} (attempt {}/{})",
                request_id, attempts, max_attempts
            );

            let attempt_result = self.gateway.submit_transaction(&signed_tx).await;
            if cancelled.load(Ordering::SeqCst) {
                // Late-arriving result; the cancel already won.
                debug!("discarding submission result for cancelled request {}", request_id);
                return Ok(SubmissionOutcome::cancelled(attempts, options.mode));
            }

            match attempt_result {
                Ok(tx_hash) => return self.finish_success(&request, tx_hash, attempts, options).await,
                Err(error) => {
                    self.append_audit(AuditEvent::new(
                        AuditEventKind::SubmissionAttemptFailed,
                        request_id,
                        None,
                        format!("attempt {}/{}: {}", attempts, max_attempts, error),
                    ))
                    .await;

                    if error.kind.retryable_in_place() && attempts < max_attempts {
                        let delay = self.backoff_delay(attempts);
                        debug!(
                            "retrying request {} in {:?} after {}",
                            request_id, delay, error
                        );
                        sleep(delay).await;
                        if cancelled.load(Ordering::SeqCst) {
                            return Ok(SubmissionOutcome::cancelled(attempts, options.mode));
                        }
                        continue;
                    }

                    return self.finish_failure(&request, error, attempts, options).await;
                }
            }
        }
    }

    async fn finish_success(
        self: &Arc<Self>,
        request: &RequestRepoModel,
        tx_hash: String,
        attempts: u32,
        options: &SubmissionOptions,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.transaction_repository
            .create(TransactionRepoModel::submitted(&request.id, &tx_hash))
            .await?;
        self.request_repository
            .update_status(&request.id, RequestStatus::Submitted)
            .await?;

        self.append_audit(AuditEvent::new(
            AuditEventKind::SubmissionSucceeded,
            &request.id,
            Some(tx_hash.clone()),
            format!("broadcast accepted after {} attempt(s)", attempts),
        ))
        .await;

        self.total_submitted.fetch_add(1, Ordering::Relaxed);
        info!(
            "request {} submitted as transaction {} after {} attempt(s)",
            request.id, tx_hash, attempts
        );

        let notification = produce_status_change_notification(
            &request.id,
            &RequestStatus::Submitted.to_string(),
            Some(tx_hash.clone()),
            None,
            None,
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("submission notification for {} not delivered: {}", request.id, e);
        }

        self.monitor
            .add_transaction(&tx_hash, &request.id, Utc::now())
            .await;

        Ok(SubmissionOutcome::succeeded(tx_hash, attempts, options.mode))
    }

    async fn finish_failure(
        self: &Arc<Self>,
        request: &RequestRepoModel,
        error: GatewayError,
        attempts: u32,
        options: &SubmissionOptions,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        // The caller may trade the failed terminal state for one more
        // delayed round, as long as the error can ever succeed again.
        if let Some(delay_ms) = options.retry_delay_ms {
            if error.kind.is_retryable() && !error.kind.needs_rebuild() {
                let mut retry_options = options.clone();
                retry_options.force = false;
                self.schedule_retry(&request.id, delay_ms, retry_options);

                let mut outcome = SubmissionOutcome::failed(&error, attempts, options.mode);
                outcome.retry_scheduled = true;
                warn!(
                    "request {} submission failed after {} attempt(s), retry in {}ms: {}",
                    request.id, attempts, delay_ms, error
                );
                return Ok(outcome);
            }
        }

        if let Err(e) = self
            .request_repository
            .update_status(&request.id, RequestStatus::Failed)
            .await
        {
            warn!("request {} status not updated on failure: {}", request.id, e);
        }

        self.append_audit(AuditEvent::new(
            AuditEventKind::SubmissionFailed,
            &request.id,
            None,
            format!("submission failed after {} attempt(s): {}", attempts, error),
        ))
        .await;

        self.total_failed.fetch_add(1, Ordering::Relaxed);
        warn!(
            "request {} submission failed after {} attempt(s): {}",
            request.id, attempts, error
        );

        let notification = produce_status_change_notification(
            &request.id,
            &RequestStatus::Failed.to_string(),
            None,
            None,
            Some(error.to_string()),
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("failure notification for {} not delivered: {}", request.id, e);
        }

        Ok(SubmissionOutcome::failed(&error, attempts, options.mode))
    }

    async fn expire_request(
        &self,
        request: &RequestRepoModel,
        tip: u64,
        mode: SubmissionMode,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let error = GatewayError::new(
            SubmissionErrorKind::TtlExpired,
            format!(
                "ttl slot {} is behind chain tip {}; transaction must be rebuilt",
                request.ttl_slot, tip
            ),
        );

        if let Err(e) = self
            .request_repository
            .update_status(&request.id, RequestStatus::Expired)
            .await
        {
            warn!("request {} status not updated on expiry: {}", request.id, e);
        }

        self.append_audit(AuditEvent::new(
            AuditEventKind::RequestExpired,
            &request.id,
            None,
            error.message.clone(),
        ))
        .await;

        self.total_failed.fetch_add(1, Ordering::Relaxed);
        info!("request {} expired before broadcast: {}", request.id, error);

        let notification = produce_status_change_notification(
            &request.id,
            &RequestStatus::Expired.to_string(),
            None,
            None,
            Some(error.to_string()),
        );
        if let Err(e) = self.notifier.send(notification).await {
            warn!("expiry notification for {} not delivered: {}", request.id, e);
        }

        Ok(SubmissionOutcome::failed(&error, 0, mode))
    }

    /// Read-only view of a request's submission state; unknown ids get the
    /// inactive default.
    pub fn get_submission_status(&self, request_id: &str) -> SubmissionStatus {
        SubmissionStatus {
            is_active: self.active.lock().contains_key(request_id),
            has_retry_scheduled: self.scheduled.lock().contains_key(request_id),
        }
    }

    /// Cancels the active attempt and/or the scheduled retry for a
    /// request. The in-flight gateway call, if any, keeps running but its
    /// result is discarded on arrival. Returns whether anything was
    /// cancelled.
    pub fn cancel_submission(&self, request_id: &str) -> bool {
        let mut any = false;
        if let Some(entry) = self.active.lock().remove(request_id) {
            entry.cancelled.store(true, Ordering::SeqCst);
            any = true;
        }
        if self.abort_scheduled_retry(request_id) {
            any = true;
        }
        if any {
            self.total_cancelled.fetch_add(1, Ordering::Relaxed);
            info!("cancelled submission state for request {}", request_id);
        }
        any
    }

    /// Arms a one-shot delayed resubmission, replacing any retry already
    /// scheduled for the same id. The registration is inserted while the
    /// map lock is held across the spawn, so even a zero-delay timer
    /// cannot fire ahead of it.
    pub fn schedule_retry(
        self: &Arc<Self>,
        request_id: &str,
        delay_ms: u64,
        options: SubmissionOptions,
    ) {
        let token = Arc::new(());
        let tracker = Arc::clone(self);
        let id = request_id.to_string();
        let task_token = Arc::clone(&token);

        let mut scheduled = self.scheduled.lock();
        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(delay_ms)).await;
            {
                let mut scheduled = tracker.scheduled.lock();
                match scheduled.get(&id) {
                    Some(entry) if Arc::ptr_eq(&entry.token, &task_token) => {
                        scheduled.remove(&id);
                    }
                    // superseded or cancelled while the timer ran
                    _ => return,
                }
            }
            match tracker.submit(&id, options).await {
                Ok(outcome) if outcome.success => {
                    debug!("scheduled retry for request {} succeeded", id)
                }
                Ok(outcome) => warn!(
                    "scheduled retry for request {} failed: {:?}",
                    id, outcome.error
                ),
                Err(error) => warn!("scheduled retry for request {} rejected: {}", id, error),
            }
        });

        if let Some(previous) = scheduled.insert(
            request_id.to_string(),
            ScheduledRetry { token, handle },
        ) {
            previous.handle.abort();
        }
        debug!("retry scheduled for request {} in {}ms", request_id, delay_ms);
    }

    pub fn get_stats(&self) -> TrackerStats {
        TrackerStats {
            active_count: self.active.lock().len(),
            scheduled_retry_count: self.scheduled.lock().len(),
            total_submitted: self.total_submitted.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_cancelled: self.total_cancelled.load(Ordering::Relaxed),
        }
    }

    /// Cancels a prior attempt on behalf of a forced override and waits
    /// (bounded) for it to observe the cancellation, so the old and new
    /// broadcasts never overlap.
    async fn cancel_for_override(&self, request_id: &str) {
        let finished = {
            let mut active = self.active.lock();
            active.remove(request_id).map(|entry| {
                entry.cancelled.store(true, Ordering::SeqCst);
                entry.finished
            })
        };
        self.abort_scheduled_retry(request_id);

        let Some(finished) = finished else {
            return;
        };
        self.total_cancelled.fetch_add(1, Ordering::Relaxed);
        let deadline = Duration::from_millis(FORCE_OVERRIDE_WAIT_MS);
        let step = Duration::from_millis(20);
        let mut waited = Duration::ZERO;
        while !finished.load(Ordering::SeqCst) && waited < deadline {
            sleep(step).await;
            waited += step;
        }
        if !finished.load(Ordering::SeqCst) {
            warn!(
                "override for request {} proceeding before prior attempt terminated",
                request_id
            );
        }
    }

    fn abort_scheduled_retry(&self, request_id: &str) -> bool {
        if let Some(retry) = self.scheduled.lock().remove(request_id) {
            retry.handle.abort();
            return true;
        }
        false
    }

    /// Exponential backoff with full jitter: uniform in `[0, initial *
    /// multiplier^(attempt-1)]`, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.config.initial_backoff_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);
        let capped = exponential.min(self.config.max_backoff_ms as f64) as u64;
        Duration::from_millis(rand::rng().random_range(0..=capped))
    }

    async fn append_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.append(event).await {
            warn!("audit entry not appended: {}", e);
        }
    }
}
