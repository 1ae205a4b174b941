//! Outbound capability interfaces for the two external services the
//! dashboard depends on, plus the HTTP clients that implement them.

pub mod gemini;
pub mod openweather;

use crate::domain::{GeoPoint, TelemetryReading};

pub use gemini::GeminiClient;
pub use openweather::OpenWeatherClient;

#[derive(thiserror::Error, Debug)]
pub enum TelemetryFetchError {
    #[error("telemetry transport error: {0}")]
    Transport(String),
    #[error("telemetry provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed telemetry response: {0}")]
    Malformed(String),
    #[error("telemetry response contained no readings")]
    Empty,
}

#[derive(thiserror::Error, Debug)]
pub enum AdvisoryRequestError {
    #[error("advisory transport error: {0}")]
    Transport(String),
    #[error("advisory provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed advisory response: {0}")]
    Malformed(String),
    #[error("advisory response contained no text")]
    NoText,
}

/// Source of air-quality readings for a coordinate.
#[async_trait::async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn fetch(&self, point: GeoPoint) -> Result<TelemetryReading, TelemetryFetchError>;
}

/// Generative text service. The returned text is used verbatim.
#[async_trait::async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryRequestError>;
}
