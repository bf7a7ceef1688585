//! Command-line and environment configuration for weathergate
//!
//! Every option can be given as a flag or through the environment variable
//! named in its help text. The parsed [`Cli`] is turned once into an
//! immutable [`Config`] that is handed to the constructors at startup.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::data::DEFAULT_OPENWEATHER_URL;

/// Error types for configuration parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The CORS origin is not a valid header value
    #[error("Invalid frontend origin: '{0}'")]
    InvalidOrigin(String),
}

/// Weathergate - cached current-weather API
#[derive(Parser, Debug)]
#[command(name = "weathergate")]
#[command(about = "HTTP weather API with a Redis-backed response cache")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Redis server hostname
    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    /// Redis server port
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    /// Redis logical database index
    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: i64,

    /// OpenWeather API key; weather lookups fail without it
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds a fetched response stays cached
    #[arg(
        long,
        env = "CACHE_EXPIRY",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_expiry: u64,

    /// Upstream current-weather endpoint
    #[arg(long, env = "OPENWEATHER_URL", default_value = DEFAULT_OPENWEATHER_URL)]
    pub openweather_url: String,

    /// The single browser origin allowed to call the API
    #[arg(long, env = "FRONTEND_ORIGIN", default_value = "http://localhost:3000")]
    pub frontend_origin: String,
}

/// Startup configuration assembled from the command line and environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the HTTP server binds
    pub listen: SocketAddr,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    /// Provider credential; `None` when unset or empty
    pub api_key: Option<String>,
    /// Cache TTL in seconds
    pub cache_expiry: u64,
    pub openweather_url: String,
    /// Allowed CORS origin
    pub frontend_origin: HeaderValue,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with validated settings
    /// * `Err(CliError)` if the frontend origin cannot be used as a header
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let frontend_origin = HeaderValue::from_str(&cli.frontend_origin)
            .map_err(|_| CliError::InvalidOrigin(cli.frontend_origin.clone()))?;

        Ok(Config {
            listen: SocketAddr::new(cli.host, cli.port),
            redis_host: cli.redis_host.clone(),
            redis_port: cli.redis_port,
            redis_db: cli.redis_db,
            api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
            cache_expiry: cli.cache_expiry,
            openweather_url: cli.openweather_url.clone(),
            frontend_origin,
        })
    }
}
