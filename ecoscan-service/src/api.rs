//! HTTP surface for the dashboard front end.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use ecoscan_client::domain::Report;
use futures::{Stream, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::WatchStream;
use tower_http::trace::TraceLayer;

use crate::{
    advisory::AdvisoryRequester,
    config::MonitorConfig,
    dashboard::DashboardView,
    map::{map_layers, validate_click, ClickRejected, MapClick, MapLayers},
    state::{SpikeCycle, Store, StoreError},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub requester: AdvisoryRequester,
    pub monitor: Arc<MonitorConfig>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    InvalidClick(#[from] ClickRejected),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidClick(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/dashboard.txt", get(dashboard_text))
        .route("/api/dashboard/stream", get(dashboard_stream))
        .route("/api/map", get(map))
        .route("/api/map/click", post(map_click))
        .route("/api/reports", get(reports))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dashboard(State(app): State<AppState>) -> Json<DashboardView> {
    Json(DashboardView::render(&app.store.snapshot()))
}

async fn dashboard_text(State(app): State<AppState>) -> String {
    DashboardView::render(&app.store.snapshot()).to_string()
}

/// One `dashboard` event per state change, starting with the current state.
async fn dashboard_stream(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(app.store.subscribe()).filter_map(|state| async move {
        match Event::default()
            .event("dashboard")
            .json_data(DashboardView::render(&state))
        {
            Ok(event) => Some(Ok::<_, Infallible>(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode dashboard event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn map(State(app): State<AppState>) -> Json<MapLayers> {
    Json(map_layers(&app.store.snapshot(), &app.monitor))
}

async fn reports(State(app): State<AppState>) -> Json<Vec<Report>> {
    Json(app.store.snapshot().reports)
}

/// Records the report right away; advice arrives later through the store.
async fn map_click(
    State(app): State<AppState>,
    Json(click): Json<MapClick>,
) -> Result<(StatusCode, Json<SpikeCycle>), ApiError> {
    let point = validate_click(click)?;
    let cycle = app.requester.report_spike(point).await?;
    Ok((StatusCode::ACCEPTED, Json(cycle)))
}
