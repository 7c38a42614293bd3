use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope pushed to the notification sink on every status change. The
/// push transport requires no acknowledgement from the core.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WebhookNotification {
    pub id: String,
    pub event: String,
    pub payload: WebhookPayload,
    pub timestamp: String,
}

impl WebhookNotification {
    pub fn new(event: String, payload: WebhookPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event,
            payload,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusChangePayload {
    pub request_id: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub confirmations: Option<u64>,
    pub failure_reason: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "payload_type")]
pub enum WebhookPayload {
    StatusChange(StatusChangePayload),
}

/// Builds the status-change event emitted on submission results, monitor
/// progress updates, and terminal transitions.
pub fn produce_status_change_notification(
    request_id: &str,
    status: &str,
    tx_hash: Option<String>,
    confirmations: Option<u64>,
    failure_reason: Option<String>,
) -> WebhookNotification {
    WebhookNotification::new(
        "status_change".to_string(),
        WebhookPayload::StatusChange(StatusChangePayload {
            request_id: request_id.to_string(),
            status: status.to_string(),
            tx_hash,
            confirmations,
            failure_reason,
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}
