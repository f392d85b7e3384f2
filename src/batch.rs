//! Batch processing of vehicle position reports.
//!
//! A batch is evaluated against the previous positions recorded before it
//! arrived. Those are replaced only after every region has been evaluated,
//! so a vehicle is checked against all regions with the same movement
//! segment regardless of region order.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::engine::evaluate;
use crate::event::ZoneEvent;
use crate::position::Position;
use crate::region::{Region, RegionId, RegionStore};
use crate::transit::{TransitState, TransitStateStore};

/// Last accepted position per vehicle.
#[derive(Debug, Clone, Default)]
pub struct PreviousPositionStore {
    positions: HashMap<String, Position>,
}

impl PreviousPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&Position> {
        self.positions.get(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn forget(&mut self, vehicle_id: &str) -> Option<Position> {
        self.positions.remove(vehicle_id)
    }

    /// Record the batch; a vehicle reported twice keeps its last report.
    pub(crate) fn replace_all<'a>(&mut self, positions: impl IntoIterator<Item = &'a Position>) {
        for position in positions {
            self.positions.insert(position.vehicle_id.clone(), position.clone());
        }
    }
}

/// Owns the tracker state and runs batches through it.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    config: TrackerConfig,
    previous: PreviousPositionStore,
    transits: TransitStateStore,
}

impl BatchProcessor {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            previous: PreviousPositionStore::new(),
            transits: TransitStateStore::new(),
        }
    }

    pub fn process_batch(&mut self, positions: &[Position], regions: &RegionStore) -> Vec<ZoneEvent> {
        process_batch(
            positions,
            regions,
            &mut self.previous,
            &mut self.transits,
            &self.config,
        )
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn previous_positions(&self) -> &PreviousPositionStore {
        &self.previous
    }

    pub fn transit_states(&self) -> &TransitStateStore {
        &self.transits
    }

    pub fn transit_state(&self, region: &RegionId, vehicle_id: &str) -> TransitState {
        self.transits.get(region, vehicle_id).copied().unwrap_or_default()
    }

    /// Discard all transit state for a region that was removed or edited.
    pub fn forget_region(&mut self, region: &RegionId) {
        self.transits.forget_region(region);
    }

    pub fn forget_vehicle(&mut self, vehicle_id: &str) {
        self.previous.forget(vehicle_id);
        self.transits.forget_vehicle(vehicle_id);
    }
}

/// A usable report paired with the vehicle's pre-batch position.
struct Candidate<'a> {
    order: usize,
    previous: &'a Position,
    current: &'a Position,
}

/// Evaluate one batch and return its events ordered by report, then region.
///
/// Malformed reports are dropped. A vehicle's first report only seeds its
/// previous position.
pub fn process_batch(
    positions: &[Position],
    regions: &RegionStore,
    previous: &mut PreviousPositionStore,
    transits: &mut TransitStateStore,
    config: &TrackerConfig,
) -> Vec<ZoneEvent> {
    let usable: Vec<&Position> = positions.iter().filter(|p| p.is_usable()).collect();
    let dropped = positions.len() - usable.len();

    let candidates: Vec<Candidate<'_>> = usable
        .iter()
        .copied()
        .enumerate()
        .filter_map(|(order, current)| {
            previous.get(&current.vehicle_id).map(|prev| Candidate {
                order,
                previous: prev,
                current,
            })
        })
        .collect();

    let mut work: Vec<(&Region, HashMap<String, TransitState>, Vec<(usize, ZoneEvent)>)> = regions
        .evaluable()
        .map(|region| (region, transits.take_region(region.id()), Vec::new()))
        .collect();

    let run = |(region, states, events): &mut (&Region, HashMap<String, TransitState>, Vec<(usize, ZoneEvent)>)| {
        *events = evaluate_region(region, &candidates, states, config);
    };
    if config.parallel_regions {
        work.par_iter_mut().for_each(run);
    } else {
        work.iter_mut().for_each(run);
    }

    let mut ordered = Vec::new();
    for (region, states, events) in work {
        transits.restore_region(region.id().clone(), states);
        ordered.extend(events);
    }
    // Stable: within one report, region order is kept.
    ordered.sort_by_key(|(order, _)| *order);
    let events: Vec<ZoneEvent> = ordered.into_iter().map(|(_, event)| event).collect();

    for event in &events {
        debug!(
            region = %event.region_id,
            vehicle = %event.vehicle_id,
            kind = event.kind.name(),
            ts = event.ts,
            "zone event"
        );
    }
    info!(
        received = positions.len(),
        dropped,
        evaluated = candidates.len(),
        events = events.len(),
        "processed position batch"
    );

    previous.replace_all(usable);
    events
}

fn evaluate_region(
    region: &Region,
    candidates: &[Candidate<'_>],
    states: &mut HashMap<String, TransitState>,
    config: &TrackerConfig,
) -> Vec<(usize, ZoneEvent)> {
    let mut events = Vec::new();
    for candidate in candidates {
        let vehicle_id = &candidate.current.vehicle_id;
        let current = states.get(vehicle_id).copied().unwrap_or_default();
        let (next, event) = evaluate(candidate.previous, candidate.current, region, &current, config);

        if next == TransitState::default() {
            states.remove(vehicle_id);
        } else if next != current {
            states.insert(vehicle_id.clone(), next);
        }
        if let Some(event) = event {
            events.push((candidate.order, event));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_store_keeps_last_report() {
        let mut store = PreviousPositionStore::new();
        let first = Position::new("v", 100, 0.0, 0.0);
        let second = Position::new("v", 110, 0.1, 0.0);
        store.replace_all([&first, &second]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("v").map(|p| p.timestamp), Some(110));
        assert!(store.forget("v").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_first_sighting_seeds_only() {
        let regions = RegionStore::new();
        let mut processor = BatchProcessor::new(TrackerConfig::default());
        let events = processor.process_batch(&[Position::new("v", 100, 0.0, 0.0)], &regions);
        assert!(events.is_empty());
        assert!(processor.previous_positions().get("v").is_some());
    }

    #[test]
    fn test_malformed_reports_dropped() {
        let regions = RegionStore::new();
        let mut processor = BatchProcessor::new(TrackerConfig::default());
        processor.process_batch(
            &[Position::new("", 100, 0.0, 0.0), Position::new("v", 100, f64::NAN, 0.0)],
            &regions,
        );
        assert!(processor.previous_positions().is_empty());
    }
}
