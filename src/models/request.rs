use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle of a transfer request. Created by the signing flow in
/// `Requested`, advanced to `Signed` once witnesses are attached, advanced
/// to `Submitted` by the tracker, and terminated at `Confirmed`, `Failed`
/// or `Expired`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RequestStatus {
    Requested,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    Expired,
}

impl RequestStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Confirmed | RequestStatus::Failed | RequestStatus::Expired
        )
    }
}

/// Durable record of a user-initiated transfer intent.
///
/// Mutation goes exclusively through the request repository's status-update
/// operation; no component holds a private copy beyond one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRepoModel {
    pub id: String,
    pub status: RequestStatus,
    pub owner: String,
    pub amount: u64,
    /// Hex-encoded pre-signed transaction body, present once witnesses are
    /// attached.
    pub signed_tx: Option<String>,
    /// Ledger slot after which the pre-signed transaction is no longer
    /// valid for broadcast.
    pub ttl_slot: u64,
    pub created_at: String,
}

/// Intake payload for registering an already-signed request with the
/// escrow. The signing flow itself is out of scope; this is the hand-off
/// point.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequestPayload {
    pub id: String,
    pub owner: String,
    pub amount: u64,
    pub signed_tx: String,
    pub ttl_slot: u64,
}

impl From<CreateRequestPayload> for RequestRepoModel {
    fn from(payload: CreateRequestPayload) -> Self {
        Self {
            id: payload.id,
            status: RequestStatus::Signed,
            owner: payload.owner,
            amount: payload.amount,
            signed_tx: Some(payload.signed_tx),
            ttl_slot: payload.ttl_slot,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
