//! Weathergate library
//!
//! A cache-aside HTTP façade over the OpenWeather current-weather API. The
//! modules are exposed for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod gateway;
pub mod server;
