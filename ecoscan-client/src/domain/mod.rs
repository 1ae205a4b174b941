pub mod geo;
pub mod report;
pub mod telemetry;

pub use geo::GeoPoint;
pub use report::Report;
pub use telemetry::TelemetryReading;
