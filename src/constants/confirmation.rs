//! Confirmation-monitor constants.
//!
//! Two time bounds govern when a broadcast transaction is given up on:
//! - **Grace period**: a transaction never seen on-chain at all is failed
//!   after this window (the broadcast likely never propagated).
//! - **Max confirmation time**: a transaction still below the required
//!   depth after this window is failed as timed out.
//!
//! A third, failure-count ceiling handles the case where the gateway itself
//! keeps erroring: after `max_retries * CHECK_FAILURE_MULTIPLIER` failed
//! checks the transaction is force-failed rather than monitored forever.

/// Confirmation depth at which a transaction is considered final.
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u64 = 3;

/// Seconds between monitor ticks.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

/// Maximum seconds a transaction may stay below the required depth
/// before it is failed with a timeout reason. 24 hours.
pub const DEFAULT_MAX_CONFIRMATION_TIME_SECS: i64 = 86_400;

/// Seconds a transaction may be absent from the chain entirely before it
/// is failed as never-propagated. 10 minutes.
pub const DEFAULT_NOT_FOUND_GRACE_SECS: i64 = 600;

/// Number of inclusion queries issued concurrently per monitor tick.
pub const DEFAULT_MONITOR_BATCH_SIZE: usize = 5;

/// Pause between monitor query batches, to avoid bursting the gateway.
pub const DEFAULT_MONITOR_BATCH_PAUSE_MS: u64 = 1_000;

/// Per-transaction check-failure ceiling is `max_retries * this`.
pub const CHECK_FAILURE_MULTIPLIER: u32 = 5;

/// Returns the per-transaction check-failure ceiling for a given
/// submission retry budget.
pub fn max_check_failures(max_retries: u32) -> u32 {
    max_retries * CHECK_FAILURE_MULTIPLIER
}
