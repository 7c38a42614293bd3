//! Submission-side constants.
//!
//! These bound how hard the relayer leans on the ledger gateway: per-request
//! attempt counts, the backoff curve between attempts, and the concurrency
//! ceilings for batch fan-out.

/// Maximum broadcast attempts per `submit` call before the request is
/// marked failed (or handed to a delayed retry, if the caller opted in).
pub const DEFAULT_MAX_SUBMISSION_ATTEMPTS: u32 = 3;

/// Initial backoff between submission attempts.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Exponential backoff multiplier between submission attempts.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Ceiling for the computed backoff, before jitter.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Default number of concurrent submissions in a batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Hard ceiling on batch concurrency. Callers may raise the default up to
/// this value but never past it, so the gateway is never treated as
/// infinitely parallel.
pub const MAX_BATCH_CONCURRENCY: usize = 5;

/// Maximum number of request ids accepted by the batch endpoint.
pub const MAX_BATCH_REQUEST_IDS: usize = 10;

/// How long the queue driver sleeps when the queue is empty.
pub const QUEUE_POLL_INTERVAL_MS: u64 = 500;

/// Upper bound on how long a forced override waits for the cancelled
/// attempt to observe its cancellation before the new submission starts.
pub const FORCE_OVERRIDE_WAIT_MS: u64 = 2_000;
