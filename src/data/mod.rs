//! Weather data models
//!
//! The upstream payload is kept as an opaque [`WeatherRecord`] so that it can
//! be cached verbatim; [`WeatherView`] is the normalized shape returned to
//! clients.

pub mod weather;

pub use weather::{WeatherClient, WeatherError, DEFAULT_OPENWEATHER_URL};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Raw "current weather" response from the upstream provider
///
/// No schema is enforced. Accessors return `None` (or an empty string for the
/// condition fields) when a field is absent or has an unexpected type.
/// Numeric fields are passed through exactly as the provider sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherRecord(Value);

impl WeatherRecord {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// True for a `null` payload or an object with no fields
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// City name (`name`)
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// ISO country code (`sys.country`)
    pub fn country(&self) -> Option<&str> {
        self.0.pointer("/sys/country").and_then(Value::as_str)
    }

    /// Temperature in Celsius (`main.temp`)
    pub fn temperature(&self) -> Option<&Number> {
        self.number_at("/main/temp")
    }

    /// Feels-like temperature in Celsius (`main.feels_like`)
    pub fn feels_like(&self) -> Option<&Number> {
        self.number_at("/main/feels_like")
    }

    /// Relative humidity percentage (`main.humidity`)
    pub fn humidity(&self) -> Option<&Number> {
        self.number_at("/main/humidity")
    }

    /// Description of the first weather condition (`weather[0].description`)
    pub fn description(&self) -> &str {
        self.first_condition("description")
    }

    /// Icon code of the first weather condition (`weather[0].icon`)
    pub fn icon(&self) -> &str {
        self.first_condition("icon")
    }

    /// Wind speed in metres per second (`wind.speed`)
    pub fn wind_speed(&self) -> Option<&Number> {
        self.number_at("/wind/speed")
    }

    fn number_at(&self, pointer: &str) -> Option<&Number> {
        match self.0.pointer(pointer) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    fn first_condition(&self, field: &str) -> &str {
        self.0
            .get("weather")
            .and_then(|conditions| conditions.get(0))
            .and_then(|condition| condition.get(field))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Normalized weather returned by `GET /weather/{city}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherView {
    pub city: Option<String>,
    pub country: Option<String>,
    /// Temperature in Celsius
    pub temperature: Option<Number>,
    /// Feels-like temperature in Celsius
    pub feels_like: Option<Number>,
    /// Relative humidity percentage
    pub humidity: Option<Number>,
    pub description: String,
    pub icon: String,
    /// Wind speed in m/s
    pub wind_speed: Option<Number>,
    /// Whether the city's entry is present in the cache at response time
    pub cached: bool,
}

impl WeatherView {
    /// Shapes a raw record into the client-facing view
    pub fn from_record(record: &WeatherRecord, cached: bool) -> Self {
        Self {
            city: record.name().map(str::to_string),
            country: record.country().map(str::to_string),
            temperature: record.temperature().cloned(),
            feels_like: record.feels_like().cloned(),
            humidity: record.humidity().cloned(),
            description: record.description().to_string(),
            icon: record.icon().to_string(),
            wind_speed: record.wind_speed().cloned(),
            cached,
        }
    }
}
