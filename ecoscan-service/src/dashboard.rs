//! Dashboard view model. Pure formatting over a state snapshot.

use std::fmt;

use ecoscan_client::domain::TelemetryReading;
use serde::Serialize;

use crate::state::DashboardState;

pub const TITLE: &str = "Eco Scan AI";
pub const SUBTITLE: &str = "IPEC Smart Campus • Industrial Hazard Detection";
pub const STATUS_BANNER: &str = "STATUS: HAZARDOUS SPIKE";
pub const PROCESSING: &str = "Processing Spike Telemetry...";
pub const PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub credits: String,
    pub advisory: String,
    pub loading: bool,
    pub status: &'static str,
    pub rows: Vec<SensorRow>,
    pub report_count: usize,
}

/// Two-decimal rendering with ties rounded away from zero (`28.125` ->
/// `28.13`). Plain `{:.2}` rounds exact ties to even.
pub fn fixed2(v: f64) -> String {
    let scaled = v * 100.0;
    if scaled.fract().abs() == 0.5 {
        return format!("{:.2}", scaled.round() / 100.0);
    }
    format!("{v:.2}")
}

fn sensor_rows(reading: Option<&TelemetryReading>) -> Vec<SensorRow> {
    let row = |label, f: fn(&TelemetryReading) -> String| SensorRow {
        label,
        value: reading.map(f).unwrap_or_else(|| PLACEHOLDER.to_string()),
    };

    vec![
        row("Hazard Index (AQI)", |r| format!("{} / 5", r.aqi)),
        row("PM 2.5", |r| format!("{} µg/m³", r.pm2_5)),
        row("Nitrogen Oxide", |r| format!("{} ppb", r.no2)),
        row("Sulfur Dioxide", |r| format!("{} ppb", r.so2)),
        row("Carbon Monoxide", |r| format!("{} ppm", fixed2(r.co))),
    ]
}

impl DashboardView {
    pub fn render(state: &DashboardState) -> Self {
        let advisory = if state.loading {
            PROCESSING.to_string()
        } else {
            format!("\"{}\"", state.advisory)
        };

        Self {
            title: TITLE,
            subtitle: SUBTITLE,
            credits: format!("{} Green Credits Earned", state.credits),
            advisory,
            loading: state.loading,
            status: STATUS_BANNER,
            rows: sensor_rows(state.telemetry.as_ref()),
            report_count: state.reports.len(),
        }
    }

    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} | {}", self.title, self.credits)?;
        writeln!(f, "{}", self.subtitle)?;
        writeln!(f)?;
        writeln!(f, "AI Health Protocol")?;
        writeln!(f, "{}", self.advisory)?;
        writeln!(f)?;
        writeln!(f, "Atmospheric Telemetry")?;
        writeln!(f, "{}", self.status)?;
        for r in &self.rows {
            writeln!(f, "{}: {}", r.label, r.value)?;
        }
        write!(f, "Reports logged: {}", self.report_count)
    }
}
