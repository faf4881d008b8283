use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod db;
mod model;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(config)
        .await
        .expect("Failed to initialize application");

    let db_pool = web::Data::new(state.db_pool.clone());
    let catalog = web::Data::from(state.catalog.clone());
    let notifications = web::Data::from(state.notifications.clone());
    let account_service = web::Data::new(state.account_service.clone());
    let triage_service = web::Data::new(state.triage_service.clone());
    let ehr_service = web::Data::new(state.ehr_service.clone());
    let prescription_service = web::Data::new(state.prescription_service.clone());

    tracing::info!("Starting Predict Care server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(db_pool.clone())
            .app_data(catalog.clone())
            .app_data(notifications.clone())
            .app_data(account_service.clone())
            .app_data(triage_service.clone())
            .app_data(ehr_service.clone())
            .app_data(prescription_service.clone())
            .configure(api::health::configure)
            .configure(api::openapi::configure)
            .configure(api::auth::configure)
            .configure(api::triage::configure)
            .configure(api::notification::configure)
            .configure(api::doctors::configure)
            .configure(api::portal::configure)
            .configure(api::prescription::configure)
            .configure(api::ehr::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
