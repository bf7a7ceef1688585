//! OpenWeather API client
//!
//! This module fetches the "current weather by city name" payload from
//! OpenWeather and returns it as an opaque [`WeatherRecord`].

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::WeatherRecord;

/// Default endpoint for current weather by city name
pub const DEFAULT_OPENWEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Upper bound on a single upstream request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The request could not be sent or timed out
    #[error("HTTP request failed: {0}")]
    RequestFailed(reqwest::Error),

    /// The provider answered with a non-success status
    #[error("{0}")]
    Status(reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl WeatherError {
    /// HTTP status returned by the provider, if any
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            WeatherError::RequestFailed(e) | WeatherError::Status(e) => e.status(),
            WeatherError::ParseError(_) => None,
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the API key in the query string
        let err = err.without_url();
        if err.is_status() {
            WeatherError::Status(err)
        } else {
            WeatherError::RequestFailed(err)
        }
    }
}

/// Client for the OpenWeather current-weather endpoint
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl WeatherClient {
    /// Creates a client for `base_url` with the standard request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current weather for `city` in metric units
    ///
    /// # Returns
    /// * `Ok(WeatherRecord)` - The provider's payload, unvalidated
    /// * `Err(WeatherError)` - On network failure, timeout, non-2xx status or
    ///   a body that is not JSON
    pub async fn fetch_current(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<WeatherRecord, WeatherError> {
        debug!(city, url = %self.base_url, "Requesting current weather");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;

        Ok(WeatherRecord::new(payload))
    }
}
