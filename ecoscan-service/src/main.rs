use anyhow::Result;
use ecoscan_client::providers::{GeminiClient, OpenWeatherClient};
use ecoscan_service::{
    advisory::AdvisoryRequester,
    api::{self, AppState},
    config::{AppConfig, Secrets},
    metrics_server, observability,
    state::{DashboardState, Store},
    telemetry::TelemetryFetcher,
};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;
    let secrets = Secrets::from_env();
    tracing::info!(?secrets, "configuration loaded");

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = Store::spawn(
        DashboardState::new(cfg.rewards.initial_credits, cfg.rewards.credits_per_report),
        cfg.server.channel_capacity,
    );

    // Telemetry: once at startup, then on the optional refresh interval.
    let weather = OpenWeatherClient::new(
        &cfg.telemetry.base_url,
        &secrets.weather_key,
        cfg.telemetry.timeout(),
    )?;
    let fetcher = TelemetryFetcher::new(Arc::new(weather), store.clone(), cfg.monitor.center());
    tokio::spawn(fetcher.run(cfg.telemetry.refresh_interval()));

    let gemini = GeminiClient::new(
        &cfg.advisory.base_url,
        &secrets.gemini_key,
        &cfg.advisory.model,
        cfg.advisory.timeout(),
    )?;
    tracing::info!(model = gemini.model(), "advisory provider ready");
    let requester = AdvisoryRequester::new(Arc::new(gemini), store.clone());

    let app = api::router(AppState {
        store,
        requester,
        monitor: Arc::new(cfg.monitor.clone()),
    });

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
