use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ErrorSeverity, GatewayError, SubmissionErrorKind};

/// Who performs the broadcast for a queued or submitted request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionMode {
    /// The relayer signs nothing but submits the pre-signed body itself.
    #[default]
    ServerSubmit,
    /// The owning wallet broadcasts; the relayer only tracks confirmation.
    WalletSubmit,
}

/// Caller-tunable knobs for one `submit` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionOptions {
    #[serde(default)]
    pub mode: SubmissionMode,
    /// Cancel any in-progress submission for the same request before
    /// starting. The override waits for the cancelled attempt to observe
    /// its cancellation before broadcasting.
    #[serde(default)]
    pub force: bool,
    /// Overrides the configured per-call attempt budget.
    pub max_attempts: Option<u32>,
    /// When set and all attempts are exhausted on a retryable error, the
    /// tracker arms a delayed retry instead of marking the request failed.
    pub retry_delay_ms: Option<u64>,
}

/// Structured analysis of the classified error carried in a failed
/// submission outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorAnalysis {
    pub kind: SubmissionErrorKind,
    pub retryable: bool,
    pub needs_rebuild: bool,
    pub severity: ErrorSeverity,
}

impl From<&GatewayError> for ErrorAnalysis {
    fn from(error: &GatewayError) -> Self {
        Self {
            kind: error.kind,
            retryable: error.kind.is_retryable(),
            needs_rebuild: error.kind.needs_rebuild(),
            severity: error.kind.severity(),
        }
    }
}

/// Terminal result of one `submit` call. Gateway failures are folded into
/// this structure rather than thrown past the tracker boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub error_analysis: Option<ErrorAnalysis>,
    pub attempts: u32,
    pub mode: SubmissionMode,
    /// Set when exhaustion was converted into a delayed retry instead of a
    /// failed request.
    pub retry_scheduled: bool,
}

impl SubmissionOutcome {
    pub fn succeeded(tx_hash: String, attempts: u32, mode: SubmissionMode) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash),
            error: None,
            error_analysis: None,
            attempts,
            mode,
            retry_scheduled: false,
        }
    }

    pub fn failed(error: &GatewayError, attempts: u32, mode: SubmissionMode) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.to_string()),
            error_analysis: Some(ErrorAnalysis::from(error)),
            attempts,
            mode,
            retry_scheduled: false,
        }
    }

    pub fn cancelled(attempts: u32, mode: SubmissionMode) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some("submission cancelled".to_string()),
            error_analysis: None,
            attempts,
            mode,
            retry_scheduled: false,
        }
    }
}

/// Tracker-side view of a request's submission state. Unknown ids report
/// the inactive default.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub is_active: bool,
    pub has_retry_scheduled: bool,
}

/// Aggregate tracker counters for observability.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerStats {
    pub active_count: usize,
    pub scheduled_retry_count: usize,
    pub total_submitted: u64,
    pub total_failed: u64,
    pub total_cancelled: u64,
}
