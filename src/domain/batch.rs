//! Bounded fan-out over the submission tracker.
//!
//! A batch call runs its ids concurrently under a semaphore so a large
//! batch cannot saturate the gateway. Per-id outcomes are independent: one
//! id failing never aborts the rest, and the result map always carries an
//! entry for every id that was asked for.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};
use tokio::sync::Semaphore;

use crate::constants::MAX_BATCH_CONCURRENCY;
use crate::models::{SubmissionOptions, SubmissionOutcome};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

use super::SubmissionTracker;

pub struct BatchSubmissionManager<G, R, T, A, N> {
    tracker: Arc<SubmissionTracker<G, R, T, A, N>>,
    default_concurrency: usize,
}

impl<G, R, T, A, N> BatchSubmissionManager<G, R, T, A, N>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        tracker: Arc<SubmissionTracker<G, R, T, A, N>>,
        default_concurrency: usize,
    ) -> Self {
        Self {
            tracker,
            default_concurrency,
        }
    }

    /// Resolves the per-call concurrency limit: caller override or the
    /// configured default, clamped into `1..=MAX_BATCH_CONCURRENCY`.
    fn effective_concurrency(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_concurrency)
            .clamp(1, MAX_BATCH_CONCURRENCY)
    }

    /// Submits every id in the batch, at most `concurrency` in flight at
    /// once. Tracker rejections (unknown id, wrong status, already active)
    /// are folded into zero-attempt failure outcomes so the map stays
    /// complete.
    pub async fn submit_batch(
        &self,
        request_ids: &[String],
        options: SubmissionOptions,
        concurrency: Option<usize>,
    ) -> HashMap<String, SubmissionOutcome> {
        let limit = self.effective_concurrency(concurrency);
        let semaphore = Arc::new(Semaphore::new(limit));
        debug!(
            "submitting batch of {} request(s) with concurrency {}",
            request_ids.len(),
            limit
        );

        let futures = request_ids.iter().map(|request_id| {
            let tracker = Arc::clone(&self.tracker);
            let semaphore = Arc::clone(&semaphore);
            let options = options.clone();
            let request_id = request_id.clone();
            async move {
                // closed only on semaphore drop, which cannot happen here
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let outcome = match tracker.submit(&request_id, options.clone()).await {
                    Ok(outcome) => outcome,
                    Err(error) => SubmissionOutcome {
                        success: false,
                        tx_hash: None,
                        error: Some(error.to_string()),
                        error_analysis: None,
                        attempts: 0,
                        mode: options.mode,
                        retry_scheduled: false,
                    },
                };
                (request_id, outcome)
            }
        });

        let results: HashMap<String, SubmissionOutcome> = join_all(futures).await.into_iter().collect();
        let succeeded = results.values().filter(|o| o.success).count();
        info!(
            "batch finished: {}/{} submissions succeeded",
            succeeded,
            results.len()
        );
        results
    }
}
