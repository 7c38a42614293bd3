//! Submission holding queue and its drain loop.
//!
//! The queue itself never submits; an external driver pulls entries and
//! invokes the tracker. Keeping the two apart means backpressure is
//! applied by simply not draining.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::constants::QUEUE_POLL_INTERVAL_MS;
use crate::models::{QueueEntry, QueuePriority, QueueStatus};

use super::SubmissionTracker;
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

#[derive(Default)]
struct QueueTiers {
    high: VecDeque<QueueEntry>,
    normal: VecDeque<QueueEntry>,
}

/// Two-tier priority FIFO. High-priority entries are always served before
/// normal ones; within a tier, oldest first.
pub struct SubmissionQueue {
    tiers: Mutex<QueueTiers>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self {
            tiers: Mutex::new(QueueTiers::default()),
        }
    }

    /// Appends to the tail of the matching tier and returns the entry's
    /// queue position (total depth at insertion time).
    pub fn enqueue(&self, entry: QueueEntry) -> usize {
        let mut tiers = self.tiers.lock();
        match entry.priority {
            QueuePriority::High => tiers.high.push_back(entry),
            QueuePriority::Normal => tiers.normal.push_back(entry),
        }
        tiers.high.len() + tiers.normal.len()
    }

    /// Pops from the high tier first, else the normal tier.
    pub fn dequeue_next(&self) -> Option<QueueEntry> {
        let mut tiers = self.tiers.lock();
        tiers.high.pop_front().or_else(|| tiers.normal.pop_front())
    }

    pub fn get_status(&self) -> QueueStatus {
        let tiers = self.tiers.lock();
        QueueStatus {
            queue_length: tiers.high.len() + tiers.normal.len(),
            high_priority_depth: tiers.high.len(),
            normal_priority_depth: tiers.normal.len(),
        }
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellable loop that drains the queue into the tracker, one entry at a
/// time. Not draining the queue is the backpressure mechanism, so the
/// driver is deliberately serial.
pub struct QueueDriver<G, R, T, A, N> {
    queue: Arc<SubmissionQueue>,
    tracker: Arc<SubmissionTracker<G, R, T, A, N>>,
    shutdown: watch::Sender<bool>,
    running: AtomicBool,
}

impl<G, R, T, A, N> QueueDriver<G, R, T, A, N>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        queue: Arc<SubmissionQueue>,
        tracker: Arc<SubmissionTracker<G, R, T, A, N>>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            tracker,
            shutdown,
            running: AtomicBool::new(false),
        }
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.send_replace(false);

        let driver = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            info!("queue driver started");
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                match driver.queue.dequeue_next() {
                    Some(entry) => driver.process_entry(entry).await,
                    None => {
                        tokio::select! {
                            _ = sleep(Duration::from_millis(QUEUE_POLL_INTERVAL_MS)) => {}
                            _ = shutdown_rx.changed() => {}
                        }
                    }
                }
            }
            driver.running.store(false, Ordering::SeqCst);
            info!("queue driver stopped");
        });
    }

    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    async fn process_entry(&self, entry: QueueEntry) {
        debug!(
            "queue driver processing request {} (priority {})",
            entry.request_id, entry.priority
        );
        match self.tracker.submit(&entry.request_id, entry.options).await {
            Ok(outcome) if outcome.success => {
                debug!(
                    "queued submission for request {} succeeded (hash {:?})",
                    entry.request_id, outcome.tx_hash
                );
            }
            Ok(outcome) => {
                warn!(
                    "queued submission for request {} failed: {:?}",
                    entry.request_id, outcome.error
                );
            }
            Err(error) => {
                warn!(
                    "queued submission for request {} rejected: {}",
                    entry.request_id, error
                );
            }
        }
    }
}
