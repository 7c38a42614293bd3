//! HTTP routes for confirmation-monitor operations.

use actix_web::{get, patch, post, web, Responder};

use crate::api::controllers::monitor;
use crate::config::MonitorConfigUpdate;
use crate::models::DefaultAppState;

#[get("/monitor/stats")]
async fn get_stats(data: web::ThinData<DefaultAppState>) -> impl Responder {
    monitor::get_stats(&data).await
}

#[post("/monitor/check/{tx_hash}")]
async fn force_check(
    tx_hash: web::Path<String>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    monitor::force_check(tx_hash.into_inner(), &data).await
}

#[patch("/monitor/config")]
async fn update_config(
    update: web::Json<MonitorConfigUpdate>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    monitor::update_config(update.into_inner(), &data).await
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(get_stats)
        .service(force_check)
        .service(update_config);
}
