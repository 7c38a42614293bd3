use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::SubmissionOptions;

/// Priority tier for queued submissions. High-priority entries are always
/// served before normal-priority ones regardless of enqueue time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueuePriority {
    #[default]
    Normal,
    High,
}

/// One submission awaiting processing in the holding queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub request_id: String,
    pub options: SubmissionOptions,
    pub priority: QueuePriority,
    pub enqueued_at: String,
}

impl QueueEntry {
    pub fn new(
        request_id: impl Into<String>,
        options: SubmissionOptions,
        priority: QueuePriority,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            options,
            priority,
            enqueued_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Queue depth snapshot for capacity reporting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueueStatus {
    pub queue_length: usize,
    pub high_priority_depth: usize,
    pub normal_priority_depth: usize,
}
