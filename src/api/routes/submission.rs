//! HTTP routes for submission operations. Handlers stay thin and delegate
//! to the submission controller.

use actix_web::{delete, get, post, web, Responder};

use crate::api::controllers::submission::{
    self, BatchSubmitRequest, QueueSubmitRequest, RetryRequest,
};
use crate::models::{DefaultAppState, SubmissionOptions};

#[post("/submit/batch")]
async fn submit_batch(
    payload: web::Json<BatchSubmitRequest>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    submission::submit_batch(payload.into_inner(), &data).await
}

#[post("/submit/queue/{request_id}")]
async fn queue_submission(
    request_id: web::Path<String>,
    payload: Option<web::Json<QueueSubmitRequest>>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();
    submission::queue_submission(request_id.into_inner(), payload, &data).await
}

#[get("/submit/status/{request_id}")]
async fn get_status(
    request_id: web::Path<String>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    submission::get_status(request_id.into_inner(), &data).await
}

#[get("/submit/stats")]
async fn get_stats(data: web::ThinData<DefaultAppState>) -> impl Responder {
    submission::get_stats(&data).await
}

#[post("/submit/{request_id}/retry")]
async fn schedule_retry(
    request_id: web::Path<String>,
    payload: web::Json<RetryRequest>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    submission::schedule_retry(request_id.into_inner(), payload.into_inner(), &data).await
}

// registered after the more specific /submit/... routes
#[post("/submit/{request_id}")]
async fn submit(
    request_id: web::Path<String>,
    options: Option<web::Json<SubmissionOptions>>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    let options = options.map(web::Json::into_inner).unwrap_or_default();
    submission::submit(request_id.into_inner(), options, &data).await
}

#[delete("/submit/{request_id}")]
async fn cancel(
    request_id: web::Path<String>,
    data: web::ThinData<DefaultAppState>,
) -> impl Responder {
    submission::cancel(request_id.into_inner(), &data).await
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_batch)
        .service(queue_submission)
        .service(get_status)
        .service(get_stats)
        .service(schedule_retry)
        .service(submit)
        .service(cancel);
}
