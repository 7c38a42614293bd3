use serde::Deserialize;

use crate::constants::{
    max_check_failures, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BATCH_CONCURRENCY,
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_MAX_CONFIRMATION_TIME_SECS, DEFAULT_MAX_SUBMISSION_ATTEMPTS,
    DEFAULT_MONITOR_BATCH_PAUSE_MS, DEFAULT_MONITOR_BATCH_SIZE, DEFAULT_NOT_FOUND_GRACE_SECS,
    DEFAULT_REQUIRED_CONFIRMATIONS,
};

/// Submission tracker tuning.
///
/// The inter-attempt backoff is exponential with full jitter: attempt `n`
/// waits a uniform duration in `[0, initial * multiplier^(n-1)]`, capped at
/// `max_backoff_ms`.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub default_batch_concurrency: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_SUBMISSION_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            default_batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

/// Confirmation monitor tuning.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval_secs: u64,
    pub required_confirmations: u64,
    pub max_confirmation_time_secs: i64,
    pub not_found_grace_secs: i64,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    /// Checks that error before the transaction is force-failed.
    pub max_check_failures: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
            max_confirmation_time_secs: DEFAULT_MAX_CONFIRMATION_TIME_SECS,
            not_found_grace_secs: DEFAULT_NOT_FOUND_GRACE_SECS,
            batch_size: DEFAULT_MONITOR_BATCH_SIZE,
            batch_pause_ms: DEFAULT_MONITOR_BATCH_PAUSE_MS,
            max_check_failures: max_check_failures(DEFAULT_MAX_SUBMISSION_ATTEMPTS),
        }
    }
}

/// Partial monitor reconfiguration; `None` fields keep their current
/// value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfigUpdate {
    pub check_interval_secs: Option<u64>,
    pub required_confirmations: Option<u64>,
    pub max_confirmation_time_secs: Option<i64>,
    pub not_found_grace_secs: Option<i64>,
    pub batch_size: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub max_check_failures: Option<u32>,
}

impl MonitorConfig {
    pub fn apply(&mut self, update: MonitorConfigUpdate) {
        if let Some(value) = update.check_interval_secs {
            self.check_interval_secs = value;
        }
        if let Some(value) = update.required_confirmations {
            self.required_confirmations = value;
        }
        if let Some(value) = update.max_confirmation_time_secs {
            self.max_confirmation_time_secs = value;
        }
        if let Some(value) = update.not_found_grace_secs {
            self.not_found_grace_secs = value;
        }
        if let Some(value) = update.batch_size {
            self.batch_size = value.max(1);
        }
        if let Some(value) = update.batch_pause_ms {
            self.batch_pause_ms = value;
        }
        if let Some(value) = update.max_check_failures {
            self.max_check_failures = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.required_confirmations, 3);
        assert_eq!(config.max_confirmation_time_secs, 86_400);
        assert_eq!(config.not_found_grace_secs, 600);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.max_check_failures, 15);
    }

    #[test]
    fn test_partial_update_keeps_unset_fields() {
        let mut config = MonitorConfig::default();
        config.apply(MonitorConfigUpdate {
            required_confirmations: Some(6),
            batch_size: Some(0),
            ..Default::default()
        });
        assert_eq!(config.required_confirmations, 6);
        // zero batch size is clamped, everything else untouched
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.check_interval_secs, 30);
    }
}
