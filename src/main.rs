//! Weathergate - cached current-weather HTTP API
//!
//! Serves OpenWeather lookups through a Redis cache with a fixed TTL, plus
//! cache administration and health endpoints.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use weathergate::cache::RedisStore;
use weathergate::cli::{Cli, Config};
use weathergate::data::WeatherClient;
use weathergate::gateway::WeatherGateway;
use weathergate::server;

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Values from .env never override variables already set
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weathergate=info,tower_http=info".into()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    let store = RedisStore::new(&config.redis_host, config.redis_port, config.redis_db)?;
    info!(redis = store.address(), "Using Redis cache store");

    let client = WeatherClient::new(config.openweather_url.clone())?;
    info!(upstream = client.base_url(), "Using OpenWeather endpoint");
    if config.api_key.is_none() {
        warn!("OPENWEATHER_API_KEY is not set; weather lookups will fail");
    }

    let gateway = WeatherGateway::new(
        Arc::new(store),
        client,
        config.api_key.clone(),
        config.cache_expiry,
    );
    info!(cache_expiry = gateway.cache_expiry(), "Weather gateway ready");

    let app = server::router(Arc::new(gateway), config.frontend_origin.clone());
    server::serve(config.listen, app, shutdown_signal()).await?;

    Ok(())
}
