use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Classification of a ledger-gateway failure.
///
/// The kind decides whether an attempt loop may retry, whether the
/// pre-signed payload has to be rebuilt by the caller before any retry can
/// help, and how loudly the failure is reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionErrorKind {
    TtlExpired,
    MissingWitnesses,
    UtxoNotFound,
    InsufficientFee,
    MalformedTransaction,
    ApiUnauthorized,
    NetworkError,
    RateLimited,
    ServerError,
    Unknown,
}

/// Severity attached to a classified failure, for observability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Error,
}

impl SubmissionErrorKind {
    /// Whether the operation can ever succeed again, possibly after the
    /// caller rebuilds the transaction.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmissionErrorKind::TtlExpired
            | SubmissionErrorKind::MissingWitnesses
            | SubmissionErrorKind::UtxoNotFound
            | SubmissionErrorKind::InsufficientFee
            | SubmissionErrorKind::NetworkError
            | SubmissionErrorKind::RateLimited
            | SubmissionErrorKind::ServerError => true,
            SubmissionErrorKind::MalformedTransaction
            | SubmissionErrorKind::ApiUnauthorized
            | SubmissionErrorKind::Unknown => false,
        }
    }

    /// Whether retrying requires the caller to rebuild and re-sign the
    /// payload first. The attempt loop treats these as terminal: the blob
    /// it holds is unusable, so burning more attempts on it cannot help.
    pub fn needs_rebuild(&self) -> bool {
        matches!(
            self,
            SubmissionErrorKind::TtlExpired | SubmissionErrorKind::MissingWitnesses
        )
    }

    /// Whether the attempt loop itself may retry with the same payload.
    pub fn retryable_in_place(&self) -> bool {
        self.is_retryable() && !self.needs_rebuild()
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SubmissionErrorKind::TtlExpired
            | SubmissionErrorKind::MissingWitnesses
            | SubmissionErrorKind::MalformedTransaction => ErrorSeverity::Critical,
            SubmissionErrorKind::UtxoNotFound
            | SubmissionErrorKind::InsufficientFee
            | SubmissionErrorKind::ApiUnauthorized => ErrorSeverity::High,
            SubmissionErrorKind::NetworkError
            | SubmissionErrorKind::RateLimited
            | SubmissionErrorKind::ServerError => ErrorSeverity::Medium,
            SubmissionErrorKind::Unknown => ErrorSeverity::Error,
        }
    }
}

/// A classified failure returned by the ledger gateway. Raw transport or
/// API errors never cross the gateway boundary unclassified.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: SubmissionErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: SubmissionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Maps a raw gateway rejection onto the submission taxonomy.
///
/// HTTP-level causes (auth, throttling, 5xx) classify from the status code;
/// ledger validation rejections come back as 400 with a reason in the body
/// and are sniffed from the message text.
pub fn classify_gateway_failure(status: Option<u16>, message: &str) -> SubmissionErrorKind {
    match status {
        Some(401) | Some(403) => return SubmissionErrorKind::ApiUnauthorized,
        Some(429) => return SubmissionErrorKind::RateLimited,
        Some(code) if code >= 500 => return SubmissionErrorKind::ServerError,
        _ => {}
    }

    let message = message.to_lowercase();
    if message.contains("outsidevalidityinterval")
        || message.contains("validityinterval")
        || message.contains("ttl")
        || message.contains("expired")
    {
        SubmissionErrorKind::TtlExpired
    } else if message.contains("missingvkeywitnesses") || message.contains("witness") {
        SubmissionErrorKind::MissingWitnesses
    } else if message.contains("badinputsutxo") || message.contains("utxo") {
        SubmissionErrorKind::UtxoNotFound
    } else if message.contains("feetoosmall") || message.contains("fee") {
        SubmissionErrorKind::InsufficientFee
    } else if message.contains("deserialise")
        || message.contains("deserialize")
        || message.contains("malformed")
        || message.contains("decode")
    {
        SubmissionErrorKind::MalformedTransaction
    } else {
        SubmissionErrorKind::Unknown
    }
}

/// Errors surfaced by the submission tracker's preconditions and
/// infrastructure. Gateway failures do not appear here; they are folded
/// into the structured submission outcome instead.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("request not found: {0}")]
    RequestNotFound(String),

    #[error("request {0} is not in a submittable status: {1}")]
    InvalidState(String, String),

    #[error("submission already in progress for request {0}")]
    AlreadyInProgress(String),

    #[error("request {0} already has a broadcast transaction on record")]
    AlreadyBroadcast(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors surfaced by the confirmation monitor's manual operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("transaction {0} is not being monitored")]
    UnknownTransaction(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Durable-store failures. These are infrastructure faults, not ledger
/// outcomes, so they are never classified through the submission taxonomy.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("webhook delivery failed: {0}")]
    DeliveryFailed(String),
}

/// HTTP-facing error type. Domain errors convert into this at the
/// controller boundary so handlers can use `?` throughout.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal Server Error: {0}")]
    InternalEyreError(#[from] eyre::Report),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> actix_web::HttpResponse {
        let body = super::ApiResponse::<()>::error(self.to_string());
        match self {
            ApiError::NotFound(_) => actix_web::HttpResponse::NotFound().json(body),
            ApiError::BadRequest(_) => actix_web::HttpResponse::BadRequest().json(body),
            ApiError::Conflict(_) => actix_web::HttpResponse::Conflict().json(body),
            ApiError::InternalError(_) | ApiError::InternalEyreError(_) => {
                actix_web::HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(error: SubmissionError) -> Self {
        match error {
            SubmissionError::RequestNotFound(_) => ApiError::NotFound(error.to_string()),
            SubmissionError::InvalidState(_, _) => ApiError::BadRequest(error.to_string()),
            SubmissionError::AlreadyInProgress(_) | SubmissionError::AlreadyBroadcast(_) => {
                ApiError::Conflict(error.to_string())
            }
            SubmissionError::Repository(e) => e.into(),
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(error: MonitorError) -> Self {
        match error {
            MonitorError::UnknownTransaction(_) => ApiError::NotFound(error.to_string()),
            MonitorError::Gateway(_) | MonitorError::Repository(_) => {
                ApiError::InternalError(error.to_string())
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(_) => ApiError::NotFound(error.to_string()),
            RepositoryError::ConstraintViolation(_) | RepositoryError::InvalidTransition(_) => {
                ApiError::Conflict(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_retryability() {
        assert!(SubmissionErrorKind::TtlExpired.is_retryable());
        assert!(SubmissionErrorKind::MissingWitnesses.is_retryable());
        assert!(SubmissionErrorKind::UtxoNotFound.is_retryable());
        assert!(SubmissionErrorKind::InsufficientFee.is_retryable());
        assert!(SubmissionErrorKind::NetworkError.is_retryable());
        assert!(SubmissionErrorKind::RateLimited.is_retryable());
        assert!(SubmissionErrorKind::ServerError.is_retryable());
        assert!(!SubmissionErrorKind::MalformedTransaction.is_retryable());
        assert!(!SubmissionErrorKind::ApiUnauthorized.is_retryable());
        assert!(!SubmissionErrorKind::Unknown.is_retryable());
    }

    #[test]
    fn test_rebuild_needed_kinds_never_retry_in_place() {
        assert!(!SubmissionErrorKind::TtlExpired.retryable_in_place());
        assert!(!SubmissionErrorKind::MissingWitnesses.retryable_in_place());
        assert!(SubmissionErrorKind::RateLimited.retryable_in_place());
        assert!(SubmissionErrorKind::NetworkError.retryable_in_place());
    }

    #[test]
    fn test_taxonomy_severity() {
        assert_eq!(
            SubmissionErrorKind::TtlExpired.severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            SubmissionErrorKind::UtxoNotFound.severity(),
            ErrorSeverity::High
        );
        assert_eq!(
            SubmissionErrorKind::RateLimited.severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(SubmissionErrorKind::Unknown.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_classify_from_status_code() {
        assert_eq!(
            classify_gateway_failure(Some(401), "nope"),
            SubmissionErrorKind::ApiUnauthorized
        );
        assert_eq!(
            classify_gateway_failure(Some(429), "slow down"),
            SubmissionErrorKind::RateLimited
        );
        assert_eq!(
            classify_gateway_failure(Some(503), "unavailable"),
            SubmissionErrorKind::ServerError
        );
    }

    #[test]
    fn test_classify_from_message() {
        assert_eq!(
            classify_gateway_failure(Some(400), "OutsideValidityIntervalUTxO"),
            SubmissionErrorKind::TtlExpired
        );
        assert_eq!(
            classify_gateway_failure(Some(400), "MissingVKeyWitnessesUTXOW"),
            SubmissionErrorKind::MissingWitnesses
        );
        assert_eq!(
            classify_gateway_failure(Some(400), "BadInputsUTxO"),
            SubmissionErrorKind::UtxoNotFound
        );
        assert_eq!(
            classify_gateway_failure(Some(400), "FeeTooSmallUTxO"),
            SubmissionErrorKind::InsufficientFee
        );
        assert_eq!(
            classify_gateway_failure(Some(400), "DeserialiseFailure"),
            SubmissionErrorKind::MalformedTransaction
        );
        assert_eq!(
            classify_gateway_failure(Some(400), "something else entirely"),
            SubmissionErrorKind::Unknown
        );
    }
}
