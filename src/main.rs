use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{middleware, web, App, HttpServer};
use dotenvy::dotenv;
use log::info;

use escrow_relayer::api::routes::configure_routes;
use escrow_relayer::config::{MonitorConfig, ServerConfig, SubmissionConfig};
use escrow_relayer::domain::{
    BatchSubmissionManager, ConfirmationMonitor, QueueDriver, SubmissionQueue, SubmissionTracker,
};
use escrow_relayer::logging::setup_logging;
use escrow_relayer::models::DefaultAppState;
use escrow_relayer::repositories::{
    InMemoryAuditLogRepository, InMemoryRequestRepository, InMemoryTransactionRepository,
};
use escrow_relayer::services::{HttpLedgerGateway, WebhookNotificationService};
use escrow_relayer::AppState;

async fn initialize_app_state(config: &ServerConfig) -> DefaultAppState {
    let gateway = Arc::new(HttpLedgerGateway::new(
        config.gateway_url.clone(),
        config.gateway_api_key.clone(),
    ));
    let request_repository = Arc::new(InMemoryRequestRepository::new());
    let transaction_repository = Arc::new(InMemoryTransactionRepository::new());
    let audit_log = Arc::new(InMemoryAuditLogRepository::new());
    let notifier = Arc::new(WebhookNotificationService::new(config.webhook_url.clone()));

    let monitor = Arc::new(ConfirmationMonitor::new(
        Arc::clone(&gateway),
        Arc::clone(&request_repository),
        Arc::clone(&transaction_repository),
        Arc::clone(&audit_log),
        Arc::clone(&notifier),
        MonitorConfig::default(),
    ));

    let submission_config = SubmissionConfig::default();
    let default_concurrency = submission_config.default_batch_concurrency;
    let tracker = Arc::new(SubmissionTracker::new(
        Arc::clone(&gateway),
        Arc::clone(&request_repository),
        Arc::clone(&transaction_repository),
        Arc::clone(&audit_log),
        Arc::clone(&notifier),
        Arc::clone(&monitor),
        submission_config,
    ));
    let batch_manager = Arc::new(BatchSubmissionManager::new(
        Arc::clone(&tracker),
        default_concurrency,
    ));
    let queue = Arc::new(SubmissionQueue::new());

    AppState {
        tracker,
        queue,
        batch_manager,
        monitor,
        request_repository,
        transaction_repository,
        audit_log,
    }
}

#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    setup_logging();

    let config = ServerConfig::from_env();
    let app_state = initialize_app_state(&config).await;

    // resume monitoring anything still pending from a previous run, then
    // start the background loops
    app_state.monitor.start().await;
    let queue_driver = Arc::new(QueueDriver::new(
        Arc::clone(&app_state.queue),
        Arc::clone(&app_state.tracker),
    ));
    queue_driver.start();

    info!("Starting server on {}:{}", config.host, config.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .wrap(Logger::default())
            .app_data(web::ThinData(app_state.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .shutdown_timeout(5);

    server.run().await?;

    queue_driver.stop();
    Ok(())
}
