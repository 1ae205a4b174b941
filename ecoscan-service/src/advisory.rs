//! Click-to-advice cycle.
//!
//! A cycle first records the report (marker, credits, loading flag) in one
//! store update, then asks the generative provider for advice. Whatever the
//! provider does, the cycle ends with exactly one completion action.

use std::sync::Arc;

use ecoscan_client::{domain::GeoPoint, AdvisoryProvider};

use crate::dashboard::fixed2;
use crate::state::{Action, AdvisoryOutcome, Applied, SpikeCycle, Store, StoreError};

pub fn build_prompt(point: GeoPoint, aqi: Option<u8>) -> String {
    let aqi = aqi.map(|a| a.to_string()).unwrap_or_else(|| "High".to_string());
    format!(
        "URGENT: User reported an industrial air spike at coordinates {}, {}. \n\
         Current AQI is {aqi}. \n\
         Act as an Emergency Response AI. Provide 2 clinical safety steps for this specific location.",
        point.lat, point.lng
    )
}

pub fn fallback_advisory(lat: f64) -> String {
    format!(
        "Spike logged at {}. Alert sent to local authorities. Stay indoors.",
        fixed2(lat)
    )
}

/// How a finished cycle ended up in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    pub cycle: SpikeCycle,
    pub outcome: AdvisoryOutcome,
    /// False when a newer cycle had already started and this one was dropped.
    pub applied: bool,
}

#[derive(Clone)]
pub struct AdvisoryRequester {
    provider: Arc<dyn AdvisoryProvider>,
    store: Store,
}

impl AdvisoryRequester {
    pub fn new(provider: Arc<dyn AdvisoryProvider>, store: Store) -> Self {
        Self { provider, store }
    }

    /// Record the report and start a cycle. Does not touch the network.
    pub async fn begin(&self, point: GeoPoint) -> Result<SpikeCycle, StoreError> {
        let applied = self
            .store
            .dispatch(Action::SpikeReported {
                point,
                at_ms: ecoscan_client::domain::report::now_millis(),
            })
            .await?;

        match applied {
            Applied::CycleStarted(cycle) => {
                metrics::counter!("spike_reports_total").increment(1);
                tracing::info!(
                    cycle = cycle.cycle,
                    report_id = cycle.report.id,
                    lat = point.lat,
                    lng = point.lng,
                    "spike reported"
                );
                Ok(cycle)
            }
            other => Err(StoreError::UnexpectedReply(format!("{other:?}"))),
        }
    }

    /// Ask the provider for advice and apply the result.
    pub async fn complete(&self, cycle: SpikeCycle) -> Result<CycleResult, StoreError> {
        metrics::counter!("advisory_requests_total").increment(1);

        let point = cycle.report.point();
        let prompt = build_prompt(point, cycle.aqi);
        let outcome = match self.provider.generate(&prompt).await {
            Ok(text) => AdvisoryOutcome::Generated(text),
            Err(e) => {
                metrics::counter!("advisory_fallback_total").increment(1);
                tracing::warn!(error = %e, cycle = cycle.cycle, "advisory request failed, using fallback");
                AdvisoryOutcome::Fallback(fallback_advisory(point.lat))
            }
        };

        let applied = self
            .store
            .dispatch(Action::AdvisoryCompleted {
                cycle: cycle.cycle,
                outcome: outcome.clone(),
            })
            .await?;

        let applied = match applied {
            Applied::AdvisoryAccepted { .. } => {
                tracing::info!(
                    cycle = cycle.cycle,
                    fallback = outcome.is_fallback(),
                    chars = outcome.text().chars().count(),
                    "advisory applied"
                );
                true
            }
            Applied::AdvisoryStale { cycle, latest } => {
                metrics::counter!("advisory_stale_total").increment(1);
                tracing::debug!(cycle, latest, "discarding advisory from superseded cycle");
                false
            }
            other => return Err(StoreError::UnexpectedReply(format!("{other:?}"))),
        };

        Ok(CycleResult {
            cycle,
            outcome,
            applied,
        })
    }

    /// Run a whole cycle and wait for it.
    pub async fn request_advisory(&self, point: GeoPoint) -> Result<CycleResult, StoreError> {
        let cycle = self.begin(point).await?;
        self.complete(cycle).await
    }

    /// Record the report, then finish the cycle on a background task.
    /// Returns as soon as the report is in the store.
    pub async fn report_spike(&self, point: GeoPoint) -> Result<SpikeCycle, StoreError> {
        let cycle = self.begin(point).await?;

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.complete(cycle).await {
                tracing::error!(error = %e, cycle = cycle.cycle, "advisory cycle aborted");
            }
        });

        Ok(cycle)
    }
}
