//! Confirmation-monitor endpoints: counters, on-demand checks, and
//! runtime config changes.

use actix_web::HttpResponse;
use log::info;

use crate::config::MonitorConfigUpdate;
use crate::models::{ApiError, ApiResponse, AppState};
use crate::repositories::{
    AuditLogRepositoryTrait, RequestRepositoryTrait, TransactionRepositoryTrait,
};
use crate::services::{LedgerGateway, NotificationSender};

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
    Ok(HttpResponse::Ok().json(ApiResponse::success(state.monitor.get_stats())))
}

pub async fn force_check<G, R, T, A, N>(
    tx_hash: String,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    state.monitor.force_check_transaction(&tx_hash).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "tx_hash": tx_hash,
        "checked": true,
    }))))
}

pub async fn update_config<G, R, T, A, N>(
    update: MonitorConfigUpdate,
    state: &AppState<G, R, T, A, N>,
) -> Result<HttpResponse, ApiError>
where
    G: LedgerGateway + 'static,
    R: RequestRepositoryTrait + 'static,
    T: TransactionRepositoryTrait + 'static,
    A: AuditLogRepositoryTrait + 'static,
    N: NotificationSender + 'static,
{
    info!("monitor config update: {:?}", update);
    state.monitor.update_config(update);
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "updated": true,
    }))))
}
