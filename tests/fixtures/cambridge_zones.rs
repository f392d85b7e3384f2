//! Zone outlines around Cambridge used by the realistic tests.
//!
//! Each zone is a quadrilateral drawn across a road; the start edge is at
//! index 0 and the finish edge at `finish_index`.

#![allow(dead_code)]

use zone_transit::geometry::LatLng;
use zone_transit::position::Position;
use zone_transit::region::Region;

/// A named zone outline.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: &'static str,
    pub name: &'static str,
    pub path: &'static [LatLng],
    pub finish_index: usize,
}

impl Zone {
    pub fn region(&self) -> Region {
        Region::new(self.id, self.path.to_vec(), self.finish_index).with_name(self.name)
    }
}

/// Westbound A1303 through Toft junction. Start edge on the east side,
/// finish edge on the west side.
pub const TOFT_OUT: Zone = Zone {
    id: "madingley_road_out",
    name: "Madingley Road OUT",
    path: &[
        LatLng::new(52.18181339776096, -0.00102996826171875),
        LatLng::new(52.190127806299266, -0.006008148193359375),
        LatLng::new(52.1878125575784, -0.019397735595703125),
        LatLng::new(52.178339830038674, -0.01682281494140625),
    ],
    finish_index: 2,
};

/// Latitude of the westbound test track through [`TOFT_OUT`].
pub const TOFT_TRACK_LAT: f64 = 52.185;

/// Unit square zone from (0,0) to (1,1): enter across the south edge,
/// leave across the north edge.
pub const UNIT_SQUARE: Zone = Zone {
    id: "square",
    name: "Square",
    path: &[
        LatLng::new(0.0, 0.0),
        LatLng::new(0.0, 1.0),
        LatLng::new(1.0, 1.0),
        LatLng::new(1.0, 0.0),
    ],
    finish_index: 2,
};

/// Position report for `vehicle` at `(lat, lng)`.
pub fn report(vehicle: &str, ts: i64, lat: f64, lng: f64) -> Position {
    Position::new(vehicle, ts, lat, lng)
}

/// Westbound reports along [`TOFT_TRACK_LAT`] at the given longitudes, ten
/// seconds apart from `start_ts`.
pub fn toft_track(vehicle: &str, start_ts: i64, lngs: &[f64]) -> Vec<Position> {
    lngs.iter()
        .enumerate()
        .map(|(i, lng)| report(vehicle, start_ts + 10 * i as i64, TOFT_TRACK_LAT, *lng))
        .collect()
}
