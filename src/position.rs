//! Vehicle position reports.

use serde::{Deserialize, Serialize};

use crate::geometry::LatLng;

/// One position report for one vehicle.
///
/// Positions are never mutated after decoding; the next report for the same
/// vehicle supersedes this one. Only the id, timestamp and coordinates are
/// used by the engine, the remaining feed fields are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub vehicle_id: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stop_sequence: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
}

impl Position {
    pub fn new(vehicle_id: impl Into<String>, timestamp: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            latitude,
            longitude,
            label: None,
            route_id: None,
            trip_id: None,
            bearing: None,
            current_stop_sequence: None,
            stop_id: None,
        }
    }

    pub fn with_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// A report the engine can evaluate: it names a vehicle and has finite
    /// coordinates.
    pub fn is_usable(&self) -> bool {
        !self.vehicle_id.is_empty() && self.location().is_finite()
    }
}
