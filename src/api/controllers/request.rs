//! Request intake and inspection. The signing flow lives elsewhere; a
//! request arrives here already signed and ready to submit.

use actix_web::HttpResponse;
use log::info;

use crate::models::{ApiError, ApiResponse, AppState, CreateRequestPayload, RequestRepoModel};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

pub async fn create_request<G, R, T, A, N>(
    payload: CreateRequestPayload,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    if payload.id.is_empty() {
        return Err(ApiError::BadRequest("request id must not be empty".to_string()));
    }
    if payload.signed_tx.is_empty() {
        return Err(ApiError::BadRequest(
            "signed transaction body must not be empty".to_string(),
        ));
    }

    let model: RequestRepoModel = payload.into();
    let created = state.request_repository.create(model).await?;
    info!("request {} registered for submission", created.id);
    Ok(HttpResponse::Created().json(ApiResponse::success(created)))
}

pub async fn get_request<G, R, T, A, N>(
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
    Ok(HttpResponse::Ok().json(ApiResponse::success(request)))
}

pub async fn get_audit_log<G, R, T, A, N>(
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
    let entries = state.audit_log.list_by_request_id(&request_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}
