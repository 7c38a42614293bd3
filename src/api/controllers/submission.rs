//! Submission endpoints: direct submit, batch fan-out, queueing, status,
//! cancellation, delayed retry, and counters.

use actix_web::HttpResponse;
use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_BATCH_REQUEST_IDS;
use crate::models::{
    ApiError, ApiResponse, AppState, QueueEntry, QueuePriority, QueueStatus, RepositoryError,
    RequestStatus, SubmissionOptions, SubmissionOutcome, SubmissionStatus, TrackerStats,
    TransactionRepoModel,
};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

#[derive(Debug, Deserialize)]
pub struct BatchSubmitRequest {
    pub request_ids: Vec<String>,
    #[serde(default)]
    pub options: SubmissionOptions,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct QueueSubmitRequest {
    #[serde(default)]
    pub options: SubmissionOptions,
    #[serde(default)]
    pub priority: QueuePriority,
}

#[derive(Debug, Deserialize)]
pub struct RetryRequest {
    pub delay_ms: u64,
    #[serde(default)]
    pub options: SubmissionOptions,
}

#[derive(Debug, Serialize)]
pub struct QueuePositionResponse {
    pub request_id: String,
    pub position: usize,
}

/// Combined view a caller polls: durable request status, live tracker
/// state, and the broadcast record if one exists.
#[derive(Debug, Serialize)]
pub struct SubmissionStatusResponse {
    pub request_id: String,
    pub request_status: RequestStatus,
    pub submission: SubmissionStatus,
    pub transaction: Option<TransactionRepoModel>,
}

#[derive(Debug, Serialize)]
pub struct PipelineStatsResponse {
    pub tracker: TrackerStats,
    pub queue: QueueStatus,
}

pub async fn submit<G, R, T, A, N>(
    request_id: String,
    options: SubmissionOptions,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    let outcome: SubmissionOutcome = state.tracker.submit(&request_id, options).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn submit_batch<G, R, T, A, N>(
    payload: BatchSubmitRequest,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    if payload.request_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "batch must contain at least one request id".to_string(),
        ));
    }
    if payload.request_ids.len() > MAX_BATCH_REQUEST_IDS {
        return Err(ApiError::BadRequest(format!(
            "batch of {} exceeds the limit of {} request ids",
            payload.request_ids.len(),
            MAX_BATCH_REQUEST_IDS
        )));
    }

    let results = state
        .batch_manager
        .submit_batch(&payload.request_ids, payload.options, payload.concurrency)
        .await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(results)))
}

pub async fn queue_submission<G, R, T, A, N>(
    request_id: String,
    payload: QueueSubmitRequest,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    // reject unknown ids up front rather than at drain time
    match state.request_repository.get_by_id(&request_id).await {
        Ok(_) => {}
        Err(RepositoryError::NotFound(_)) => {
            return Err(ApiError::NotFound(format!("request not found: {request_id}")))
        }
        Err(e) => return Err(e.into()),
    }

    let position = state.queue.enqueue(QueueEntry::new(
        request_id.clone(),
        payload.options,
        payload.priority,
    ));
    info!("request {} queued at position {}", request_id, position);
    Ok(HttpResponse::Accepted().json(ApiResponse::success(QueuePositionResponse {
        request_id,
        position,
    })))
}

pub async fn get_status<G, R, T, A, N>(
    request_id: String,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    let request = state.request_repository.get_by_id(&request_id).await?;
    let submission = state.tracker.get_submission_status(&request_id);
    let transaction = state
        .transaction_repository
        .get_by_request_id(&request_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SubmissionStatusResponse {
        request_id,
        request_status: request.status,
        submission,
        transaction,
    })))
}

pub async fn cancel<G, R, T, A, N>(
    request_id: String,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    let cancelled = state.tracker.cancel_submission(&request_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "request_id": request_id,
        "cancelled": cancelled,
    }))))
}

pub async fn schedule_retry<G, R, T, A, N>(
    request_id: String,
    payload: RetryRequest,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    match state.request_repository.get_by_id(&request_id).await {
        Ok(request) if request.status == RequestStatus::Signed => {}
        Ok(request) => {
            return Err(ApiError::BadRequest(format!(
                "request {} is not in a submittable status: {}",
                request_id, request.status
            )))
        }
        Err(RepositoryError::NotFound(_)) => {
            return Err(ApiError::NotFound(format!("request not found: {request_id}")))
        }
        Err(e) => return Err(e.into()),
    }

    state
        .tracker
        .schedule_retry(&request_id, payload.delay_ms, payload.options);
    Ok(HttpResponse::Accepted().json(ApiResponse::success(serde_json::json!({
        "request_id": request_id,
        "retry_in_ms": payload.delay_ms,
    }))))
}

pub async fn get_stats<G, R, T, A, N>(
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    Ok(HttpResponse::Ok().json(ApiResponse::success(PipelineStatsResponse {
        tracker: state.tracker.get_stats(),
        queue: state.queue.get_status(),
    })))
}
