use ecoscan_client::{
    domain::GeoPoint,
    providers::{gemini, openweather},
};
use serde::Deserialize;
use std::{fs, io, time::Duration};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            channel_capacity: 64,
        }
    }
}

/// The fixed point the dashboard watches, and how the map presents it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    pub hazard_radius_m: f64,
    pub report_radius_m: f64,
    pub tile_url: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            lat: 28.6589,
            lng: 77.3459,
            zoom: 15,
            hazard_radius_m: 800.0,
            report_radius_m: 150.0,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub initial_credits: u64,
    pub credits_per_report: u64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            initial_credits: 110,
            credits_per_report: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Re-fetch period. Absent means a single fetch at startup.
    pub refresh_interval_secs: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: openweather::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            refresh_interval_secs: None,
        }
    }
}

impl TelemetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            model: gemini::DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl AdvisoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub rewards: RewardsConfig,
    pub telemetry: TelemetryConfig,
    pub advisory: AdvisoryConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ECOSCAN_CONFIG").unwrap_or_else(|_| "ecoscan-config.toml".to_string());
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path, "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

/// Provider credentials. Read from the environment and never validated
/// locally; a missing key surfaces as a provider-side auth failure.
#[derive(Clone, Default)]
pub struct Secrets {
    pub weather_key: String,
    pub gemini_key: String,
}

impl Secrets {
    pub fn from_env() -> Self {
        use std::env;

        Self {
            weather_key: env::var("WEATHER_KEY").unwrap_or_default(),
            gemini_key: env::var("GEMINI_KEY").unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("weather_key", &(!self.weather_key.is_empty()))
            .field("gemini_key", &(!self.gemini_key.is_empty()))
            .finish()
    }
}
