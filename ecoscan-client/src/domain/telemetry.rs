use serde::{Deserialize, Serialize};

/// Lowest and highest values of the provider's air-quality index scale.
pub const AQI_MIN: u8 = 1;
pub const AQI_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub aqi: u8,
    pub pm2_5: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
}
