use std::time::Duration;

use serde::Deserialize;

use super::{TelemetryFetchError, TelemetryProvider};
use crate::domain::{
    telemetry::{AQI_MAX, AQI_MIN},
    GeoPoint, TelemetryReading,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Client for OpenWeather's current air-pollution endpoint.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Deserialize)]
struct AirPollutionEntry {
    main: AirPollutionMain,
    components: AirPollutionComponents,
}

#[derive(Deserialize)]
struct AirPollutionMain {
    aqi: u8,
}

#[derive(Deserialize)]
struct AirPollutionComponents {
    pm2_5: f64,
    no2: f64,
    so2: f64,
    co: f64,
}

impl TryFrom<AirPollutionEntry> for TelemetryReading {
    type Error = TelemetryFetchError;

    fn try_from(e: AirPollutionEntry) -> Result<Self, Self::Error> {
        if !(AQI_MIN..=AQI_MAX).contains(&e.main.aqi) {
            return Err(TelemetryFetchError::Malformed(format!(
                "aqi {} outside {AQI_MIN}..={AQI_MAX}",
                e.main.aqi
            )));
        }

        Ok(TelemetryReading {
            aqi: e.main.aqi,
            pm2_5: e.components.pm2_5,
            no2: e.components.no2,
            so2: e.components.so2,
            co: e.components.co,
        })
    }
}

/// Parse an air-pollution response body, keeping only the first reading.
pub fn parse_air_pollution(body: &str) -> Result<TelemetryReading, TelemetryFetchError> {
    let parsed: AirPollutionResponse =
        serde_json::from_str(body).map_err(|e| TelemetryFetchError::Malformed(e.to_string()))?;

    parsed
        .list
        .into_iter()
        .next()
        .ok_or(TelemetryFetchError::Empty)?
        .try_into()
}

impl OpenWeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelemetryFetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryFetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/air_pollution", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for OpenWeatherClient {
    async fn fetch(&self, point: GeoPoint) -> Result<TelemetryReading, TelemetryFetchError> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| TelemetryFetchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryFetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TelemetryFetchError::Transport(e.without_url().to_string()))?;

        tracing::debug!(bytes = body.len(), "air pollution response received");
        parse_air_pollution(&body)
    }
}
