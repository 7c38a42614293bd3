//! HTTP routes for request intake and inspection.

use actix_web::{get, post, web, Responder};

use crate::api::controllers::request;
use crate::models::{CreateRequestPayload, DefaultAppState};

#[post("/requests")]
async fn create_request(
    payload: web::Json<CreateRequestPayload>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    request::create_request(payload.into_inner(), &data).await
}

#[get("/requests/{request_id}")]
async fn get_request(
    request_id: web::Path<String>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    request::get_request(request_id.into_inner(), &data).await
}

#[get("/requests/{request_id}/audit")]
async fn get_audit_log(
    request_id: web::Path<String>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    request::get_audit_log(request_id.into_inner(), &data).await
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(create_request)
        .service(get_request)
        .service(get_audit_log);
}
