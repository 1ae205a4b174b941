//! Session state for the dashboard.
//!
//! `DashboardState::apply` is the only way state changes. The [`Store`]
//! owns one instance and applies actions one at a time, so every update
//! below is atomic with respect to the others.

pub mod store;

use ecoscan_client::domain::{GeoPoint, Report, TelemetryReading};
use serde::Serialize;

pub use store::{Store, StoreError};

pub const INITIAL_ADVISORY: &str = "Scan the map or click a zone to report a spike...";

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub telemetry: Option<TelemetryReading>,
    pub reports: Vec<Report>,
    pub credits: u64,
    pub advisory: String,
    pub loading: bool,
    /// Number of the most recently started advisory cycle; 0 before any click.
    pub latest_cycle: u64,
    credits_per_report: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryOutcome {
    Generated(String),
    Fallback(String),
}

impl AdvisoryOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(t) | Self::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    TelemetryLoaded(TelemetryReading),
    SpikeReported { point: GeoPoint, at_ms: i64 },
    AdvisoryCompleted { cycle: u64, outcome: AdvisoryOutcome },
}

/// What the recorded part of an advisory cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpikeCycle {
    pub cycle: u64,
    pub report: Report,
    /// AQI known at the moment of the click, used for the prompt.
    #[serde(skip)]
    pub aqi: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    TelemetryReplaced,
    CycleStarted(SpikeCycle),
    AdvisoryAccepted { cycle: u64 },
    AdvisoryStale { cycle: u64, latest: u64 },
}

impl DashboardState {
    pub fn new(initial_credits: u64, credits_per_report: u64) -> Self {
        Self {
            telemetry: None,
            reports: Vec::new(),
            credits: initial_credits,
            advisory: INITIAL_ADVISORY.to_string(),
            loading: false,
            latest_cycle: 0,
            credits_per_report,
        }
    }

    pub fn apply(&mut self, action: Action) -> Applied {
        match action {
            Action::TelemetryLoaded(reading) => {
                self.telemetry = Some(reading);
                Applied::TelemetryReplaced
            }
            Action::SpikeReported { point, at_ms } => {
                // Ids key the map markers, so keep them strictly increasing.
                let id = match self.reports.last() {
                    Some(last) if at_ms <= last.id => last.id + 1,
                    _ => at_ms,
                };
                let report = Report::new(id, point);

                self.reports.push(report);
                self.credits = self.credits.saturating_add(self.credits_per_report);
                self.loading = true;
                self.latest_cycle += 1;

                Applied::CycleStarted(SpikeCycle {
                    cycle: self.latest_cycle,
                    report,
                    aqi: self.telemetry.map(|t| t.aqi),
                })
            }
            Action::AdvisoryCompleted { cycle, outcome } => {
                if cycle != self.latest_cycle {
                    return Applied::AdvisoryStale {
                        cycle,
                        latest: self.latest_cycle,
                    };
                }
                self.advisory = match outcome {
                    AdvisoryOutcome::Generated(t) | AdvisoryOutcome::Fallback(t) => t,
                };
                self.loading = false;
                Applied::AdvisoryAccepted { cycle }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(aqi: u8) -> TelemetryReading {
        TelemetryReading {
            aqi,
            pm2_5: 55.2,
            no2: 40.1,
            so2: 12.3,
            co: 0.8,
        }
    }

    fn start(state: &mut DashboardState, lat: f64, lng: f64, at_ms: i64) -> SpikeCycle {
        match state.apply(Action::SpikeReported {
            point: GeoPoint::new(lat, lng),
            at_ms,
        }) {
            Applied::CycleStarted(c) => c,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn new_state_has_no_telemetry_and_initial_advisory() {
        let s = DashboardState::new(110, 10);
        assert!(s.telemetry.is_none());
        assert!(s.reports.is_empty());
        assert_eq!(s.credits, 110);
        assert_eq!(s.advisory, INITIAL_ADVISORY);
        assert!(!s.loading);
    }

    #[test]
    fn telemetry_is_replaced_not_merged() {
        let mut s = DashboardState::new(0, 10);
        s.apply(Action::TelemetryLoaded(reading(2)));
        let newer = TelemetryReading {
            aqi: 5,
            pm2_5: 1.0,
            no2: 2.0,
            so2: 3.0,
            co: 4.0,
        };
        assert_eq!(s.apply(Action::TelemetryLoaded(newer)), Applied::TelemetryReplaced);
        assert_eq!(s.telemetry, Some(newer));
    }

    #[test]
    fn spike_appends_report_and_credits_before_any_advisory() {
        let mut s = DashboardState::new(110, 10);
        let c = start(&mut s, 28.66, 77.35, 1_000);

        assert_eq!(c.cycle, 1);
        assert_eq!(c.report, Report::new(1_000, GeoPoint::new(28.66, 77.35)));
        assert_eq!(c.aqi, None);
        assert_eq!(s.reports, vec![c.report]);
        assert_eq!(s.credits, 120);
        assert!(s.loading);
        assert_eq!(s.advisory, INITIAL_ADVISORY);
    }

    #[test]
    fn spike_captures_current_aqi() {
        let mut s = DashboardState::new(0, 10);
        s.apply(Action::TelemetryLoaded(reading(4)));
        let c = start(&mut s, 1.0, 2.0, 5);
        assert_eq!(c.aqi, Some(4));
    }

    #[test]
    fn report_ids_stay_unique_within_one_millisecond() {
        let mut s = DashboardState::new(0, 10);
        let a = start(&mut s, 1.0, 1.0, 500);
        let b = start(&mut s, 1.0, 1.0, 500);
        let c = start(&mut s, 1.0, 1.0, 400);
        assert_eq!((a.report.id, b.report.id, c.report.id), (500, 501, 502));
        assert_eq!(s.reports.len(), 3);
        assert_eq!(s.credits, 30);
    }

    #[test]
    fn completion_of_latest_cycle_sets_text_and_clears_loading() {
        let mut s = DashboardState::new(0, 10);
        let c = start(&mut s, 1.0, 1.0, 1);
        let applied = s.apply(Action::AdvisoryCompleted {
            cycle: c.cycle,
            outcome: AdvisoryOutcome::Generated("Close windows.".to_string()),
        });
        assert_eq!(applied, Applied::AdvisoryAccepted { cycle: 1 });
        assert_eq!(s.advisory, "Close windows.");
        assert!(!s.loading);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut s = DashboardState::new(0, 10);
        let first = start(&mut s, 1.0, 1.0, 1);
        let second = start(&mut s, 2.0, 2.0, 2);

        let applied = s.apply(Action::AdvisoryCompleted {
            cycle: first.cycle,
            outcome: AdvisoryOutcome::Generated("old".to_string()),
        });
        assert_eq!(applied, Applied::AdvisoryStale { cycle: 1, latest: 2 });
        assert_eq!(s.advisory, INITIAL_ADVISORY);
        assert!(s.loading);

        s.apply(Action::AdvisoryCompleted {
            cycle: second.cycle,
            outcome: AdvisoryOutcome::Fallback("new".to_string()),
        });
        assert_eq!(s.advisory, "new");
        assert!(!s.loading);
        assert_eq!(s.reports.len(), 2);
        assert_eq!(s.credits, 20);
    }

    #[test]
    fn outcome_text_and_kind() {
        let g = AdvisoryOutcome::Generated("a".to_string());
        let f = AdvisoryOutcome::Fallback("b".to_string());
        assert_eq!(g.text(), "a");
        assert!(!g.is_fallback());
        assert_eq!(f.text(), "b");
        assert!(f.is_fallback());
    }
}
