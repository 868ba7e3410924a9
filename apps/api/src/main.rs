//! Hectara access-control API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use hectara_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_services::{build_app_state, build_postgres_adapters, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config).await?;

    if config.command == ApiCommand::Migrate {
        info!("migrations completed");
        return Ok(());
    }

    let app_state = build_app_state(build_postgres_adapters(&pool, &config));

    if config.seed_permission_catalog || config.command == ApiCommand::Seed {
        app_state.permission_catalog_service.seed_catalog().await?;
    }

    if config.command == ApiCommand::Seed {
        return Ok(());
    }

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, cache_ttl = ?config.permission_cache_ttl, "hectara api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
