use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use chrono::Utc;

/// Status of one broadcast attempt outcome. Mirrors the submitted tail of
/// the request lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransactionStatus {
    Submitted,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Confirmed | TransactionStatus::Failed
        )
    }
}

/// Durable audit-trail row for a broadcast attempt. Never deleted, only
/// updated; at most one live record per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRepoModel {
    pub request_id: String,
    /// Null until a broadcast reaches the ledger.
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    pub submitted_at: String,
    pub confirmations: u64,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    pub failure_reason: Option<String>,
}

impl TransactionRepoModel {
    /// Fresh record for a broadcast that just reached the ledger.
    pub fn submitted(request_id: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tx_hash: Some(tx_hash.into()),
            status: TransactionStatus::Submitted,
            submitted_at: Utc::now().to_rfc3339(),
            confirmations: 0,
            block_height: None,
            block_hash: None,
            failure_reason: None,
        }
    }
}

/// Partial update applied to a transaction record. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdateRequest {
    pub status: Option<TransactionStatus>,
    pub confirmations: Option<u64>,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    pub failure_reason: Option<String>,
}

/// Kinds of events appended to the audit log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditEventKind {
    SubmissionAttemptFailed,
    SubmissionSucceeded,
    SubmissionFailed,
    RequestExpired,
    TransactionConfirmed,
    TransactionFailed,
}

/// Append-only audit entry. Every submission attempt outcome and every
/// monitor terminal transition produces exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub kind: AuditEventKind,
    pub request_id: String,
    pub tx_hash: Option<String>,
    pub details: String,
    pub timestamp: String,
}

impl AuditEvent {
    pub fn new(
        kind: AuditEventKind,
        request_id: impl Into<String>,
        tx_hash: Option<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            request_id: request_id.into(),
            tx_hash,
            details: details.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submitted_record_defaults() {
        let tx = TransactionRepoModel::submitted("req-1", "deadbeef");
        assert_eq!(tx.status, TransactionStatus::Submitted);
        assert_eq!(tx.confirmations, 0);
        assert!(tx.block_height.is_none());
        assert!(tx.failure_reason.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TransactionStatus::Confirmed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(!TransactionStatus::Submitted.is_terminal());
    }
}
