//! Map surface: the layers a Leaflet-style front end draws, and the click
//! input it sends back.

use ecoscan_client::domain::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::{config::MonitorConfig, state::DashboardState};

const HAZARD_COLOR: &str = "#b71c1c";
const HAZARD_FILL_OPACITY: f64 = 0.35;
const HAZARD_WEIGHT: u8 = 2;
const REPORT_COLOR: &str = "orange";

/// Mirrors Leaflet's `pathOptions` keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOptions {
    pub color: &'static str,
    pub fill_color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleLayer {
    /// Report id for report circles; absent for the hazard circle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<i64>,
    pub center: GeoPoint,
    pub radius_m: f64,
    pub path_options: PathOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayers {
    pub center: GeoPoint,
    pub zoom: u8,
    pub tile_url: String,
    pub hazard: Option<CircleLayer>,
    pub reports: Vec<CircleLayer>,
}

pub fn map_layers(state: &DashboardState, monitor: &MonitorConfig) -> MapLayers {
    let hazard = state.telemetry.map(|_| CircleLayer {
        key: None,
        center: monitor.center(),
        radius_m: monitor.hazard_radius_m,
        path_options: PathOptions {
            color: HAZARD_COLOR,
            fill_color: HAZARD_COLOR,
            fill_opacity: Some(HAZARD_FILL_OPACITY),
            weight: Some(HAZARD_WEIGHT),
        },
    });

    let reports = state
        .reports
        .iter()
        .map(|r| CircleLayer {
            key: Some(r.id),
            center: r.point(),
            radius_m: monitor.report_radius_m,
            path_options: PathOptions {
                color: REPORT_COLOR,
                fill_color: REPORT_COLOR,
                fill_opacity: None,
                weight: None,
            },
        })
        .collect();

    MapLayers {
        center: monitor.center(),
        zoom: monitor.zoom,
        tile_url: monitor.tile_url.clone(),
        hazard,
        reports,
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MapClick {
    pub lat: f64,
    pub lng: f64,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("click coordinates out of range: lat={lat}, lng={lng}")]
pub struct ClickRejected {
    pub lat: f64,
    pub lng: f64,
}

/// Clicks arrive from the network, so range-check them before they become
/// reports.
pub fn validate_click(click: MapClick) -> Result<GeoPoint, ClickRejected> {
    let point = GeoPoint::new(click.lat, click.lng);
    if point.is_valid() {
        Ok(point)
    } else {
        metrics::counter!("map_click_rejected_total").increment(1);
        Err(ClickRejected {
            lat: click.lat,
            lng: click.lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Action;
    use ecoscan_client::domain::TelemetryReading;

    fn reading() -> TelemetryReading {
        TelemetryReading {
            aqi: 4,
            pm2_5: 55.2,
            no2: 40.1,
            so2: 12.3,
            co: 0.8,
        }
    }

    #[test]
    fn no_hazard_circle_without_telemetry() {
        let state = DashboardState::new(110, 10);
        let layers = map_layers(&state, &MonitorConfig::default());

        assert!(layers.hazard.is_none());
        assert!(layers.reports.is_empty());
        assert_eq!(layers.center, GeoPoint::new(28.6589, 77.3459));
        assert_eq!(layers.zoom, 15);
        assert_eq!(layers.tile_url, "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png");
    }

    #[test]
    fn hazard_circle_centered_on_monitored_point() {
        let mut state = DashboardState::new(110, 10);
        state.apply(Action::TelemetryLoaded(reading()));
        let layers = map_layers(&state, &MonitorConfig::default());

        let hazard = layers.hazard.unwrap();
        assert_eq!(hazard.center, GeoPoint::new(28.6589, 77.3459));
        assert_eq!(hazard.radius_m, 800.0);
        assert_eq!(hazard.path_options.color, "#b71c1c");
        assert_eq!(hazard.path_options.fill_opacity, Some(0.35));
        assert_eq!(hazard.path_options.weight, Some(2));
    }

    #[test]
    fn one_circle_per_report_in_order_keyed_by_id() {
        let mut state = DashboardState::new(110, 10);
        state.apply(Action::SpikeReported {
            point: GeoPoint::new(28.66, 77.35),
            at_ms: 10,
        });
        state.apply(Action::SpikeReported {
            point: GeoPoint::new(28.66, 77.35),
            at_ms: 20,
        });
        let layers = map_layers(&state, &MonitorConfig::default());

        let keys: Vec<_> = layers.reports.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec![Some(10), Some(20)]);
        assert!(layers
            .reports
            .iter()
            .all(|c| c.center == GeoPoint::new(28.66, 77.35) && c.radius_m == 150.0));
    }

    #[test]
    fn path_options_serialize_with_leaflet_keys() {
        let mut state = DashboardState::new(110, 10);
        state.apply(Action::TelemetryLoaded(reading()));
        state.apply(Action::SpikeReported {
            point: GeoPoint::new(1.0, 2.0),
            at_ms: 7,
        });
        let json = serde_json::to_value(map_layers(&state, &MonitorConfig::default())).unwrap();

        assert_eq!(json["hazard"]["path_options"]["fillColor"], "#b71c1c");
        assert_eq!(json["hazard"]["path_options"]["fillOpacity"], 0.35);
        assert!(json["hazard"].get("key").is_none());
        assert_eq!(json["reports"][0]["key"], 7);
        assert_eq!(json["reports"][0]["path_options"]["color"], "orange");
        assert!(json["reports"][0]["path_options"].get("weight").is_none());
    }

    #[test]
    fn validate_click_accepts_map_coordinates() {
        let p = validate_click(MapClick {
            lat: 28.66,
            lng: 77.35,
        })
        .unwrap();
        assert_eq!(p, GeoPoint::new(28.66, 77.35));
    }

    #[test]
    fn validate_click_rejects_out_of_range() {
        let res = validate_click(MapClick {
            lat: 128.0,
            lng: 77.35,
        });
        assert_eq!(
            res,
            Err(ClickRejected {
                lat: 128.0,
                lng: 77.35
            })
        );
    }
}
