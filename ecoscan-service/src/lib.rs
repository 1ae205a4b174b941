pub mod advisory;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod map;
pub mod metrics_server;
pub mod observability;
pub mod state;
pub mod telemetry;

pub use advisory::AdvisoryRequester;
pub use state::{DashboardState, Store};
