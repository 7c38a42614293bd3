//! # API Routes Module
//!
//! Configures HTTP routes for the escrow relayer API.
//!
//! ## Routes
//!
//! * `/health` - Health check endpoint
//! * `/api/v1/requests` - Request intake and inspection
//! * `/api/v1/submit` - Submission operations
//! * `/api/v1/monitor` - Confirmation monitor operations

pub mod health;
pub mod monitor;
pub mod request;
pub mod submission;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::init).service(
        web::scope("/api/v1")
            .configure(request::init)
            .configure(submission::init)
            .configure(monitor::init),
    );
}
