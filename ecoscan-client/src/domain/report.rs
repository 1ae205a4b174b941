use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::GeoPoint;

/// A user-submitted pollution spike. `id` is the creation time in
/// milliseconds since the Unix epoch and doubles as the map key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
}

impl Report {
    pub fn new(id: i64, point: GeoPoint) -> Self {
        Self {
            id,
            lat: point.lat,
            lng: point.lng,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Current wall-clock time as Unix milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
