//! Tessera API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tessera_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StoreBackend, init_tracing};
use crate::api_services::StorePorts;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let ports = match &config.store_backend {
        StoreBackend::Postgres { database_url } => {
            let pool = api_services::connect_and_migrate(database_url).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }
            StorePorts::postgres(&pool)
        }
        StoreBackend::Memory => {
            tracing::warn!("STORE_BACKEND=memory: state is lost on restart");
            StorePorts::in_memory()
        }
    };

    let app_state = api_services::build_app_state(ports, &config)?;
    let app = api_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "tessera api listening");
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("API server failed: {error}")))
}
