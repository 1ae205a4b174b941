use std::{sync::Arc, time::Duration};

use ecoscan_client::{domain::GeoPoint, TelemetryProvider};

use crate::state::{Action, Store, StoreError};

/// Pulls air-quality readings for the monitored point into the store.
#[derive(Clone)]
pub struct TelemetryFetcher {
    provider: Arc<dyn TelemetryProvider>,
    store: Store,
    point: GeoPoint,
}

impl TelemetryFetcher {
    pub fn new(provider: Arc<dyn TelemetryProvider>, store: Store, point: GeoPoint) -> Self {
        Self {
            provider,
            store,
            point,
        }
    }

    /// Fetch once. Provider failures are logged and leave the previous
    /// reading in place; only a closed store is reported to the caller.
    /// Returns whether a new reading was stored.
    pub async fn refresh(&self) -> Result<bool, StoreError> {
        metrics::counter!("telemetry_fetch_total").increment(1);

        match self.provider.fetch(self.point).await {
            Ok(reading) => {
                tracing::info!(
                    aqi = reading.aqi,
                    pm2_5 = reading.pm2_5,
                    lat = self.point.lat,
                    lng = self.point.lng,
                    "telemetry updated"
                );
                self.store.dispatch(Action::TelemetryLoaded(reading)).await?;
                Ok(true)
            }
            Err(e) => {
                metrics::counter!("telemetry_fetch_failed_total").increment(1);
                tracing::warn!(error = %e, "telemetry fetch failed, keeping previous reading");
                Ok(false)
            }
        }
    }

    /// Fetch now, then every `interval` when one is given.
    pub async fn run(self, interval: Option<Duration>) {
        if let Err(e) = self.refresh().await {
            tracing::error!(error = %e, "telemetry fetcher stopped");
            return;
        }

        let Some(period) = interval else {
            return;
        };

        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; the startup fetch covered it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                tracing::error!(error = %e, "telemetry fetcher stopped");
                return;
            }
        }
    }
}
