pub mod domain;
pub mod providers;

pub use providers::{AdvisoryProvider, AdvisoryRequestError, TelemetryFetchError, TelemetryProvider};
