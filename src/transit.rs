//! Per (region, vehicle) transit state.

use std::collections::HashMap;

use serde::Serialize;

use crate::geometry::LatLng;
use crate::region::RegionId;

/// Where and when a vehicle crossed a region's start line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StartCrossing {
    pub position: LatLng,
    /// Fraction along the entry movement at which the start line was crossed.
    pub progress: f64,
    /// Interpolated crossing time (unix seconds).
    pub timestamp: f64,
    /// Time between the two samples the crossing was interpolated from.
    pub sample_interval: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransitStatus {
    #[default]
    Outside,
    /// Inside, but entered without crossing the start line.
    InsidePendingNoStart,
    /// Inside after a clean start.
    InsideStarted(StartCrossing),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransitState {
    pub status: TransitStatus,
    /// Metres travelled inside the region since entry.
    pub distance_m: f64,
}

impl TransitState {
    pub fn in_bounds(&self) -> bool {
        !matches!(self.status, TransitStatus::Outside)
    }

    pub fn start(&self) -> Option<&StartCrossing> {
        match &self.status {
            TransitStatus::InsideStarted(start) => Some(start),
            _ => None,
        }
    }
}

/// Transit states keyed by region id, then vehicle id.
///
/// States are created lazily: a vehicle that has never been seen inside a
/// region has no entry and reads as [`TransitStatus::Outside`].
#[derive(Debug, Clone, Default)]
pub struct TransitStateStore {
    regions: HashMap<RegionId, HashMap<String, TransitState>>,
}

impl TransitStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: &RegionId, vehicle_id: &str) -> Option<&TransitState> {
        self.regions.get(region)?.get(vehicle_id)
    }

    /// Drop every state held for `region`, e.g. when it is deactivated or deleted.
    pub fn forget_region(&mut self, region: &RegionId) {
        self.regions.remove(region);
    }

    pub fn forget_vehicle(&mut self, vehicle_id: &str) {
        for states in self.regions.values_mut() {
            states.remove(vehicle_id);
        }
        self.regions.retain(|_, states| !states.is_empty());
    }

    /// Number of (region, vehicle) states held.
    pub fn len(&self) -> usize {
        self.regions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detach the states of one region so it can be evaluated on its own.
    pub(crate) fn take_region(&mut self, region: &RegionId) -> HashMap<String, TransitState> {
        self.regions.remove(region).unwrap_or_default()
    }

    pub(crate) fn restore_region(&mut self, region: RegionId, states: HashMap<String, TransitState>) {
        if !states.is_empty() {
            self.regions.insert(region, states);
        }
    }
}
