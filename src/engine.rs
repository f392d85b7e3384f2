//! Zone crossing detection for one vehicle against one region.
//!
//! [`evaluate`] is a pure function of the previous sample, the current
//! sample, the region and the stored transit state. It returns the next
//! state and at most one classified event:
//!
//! | stored      | now inside | start/finish line crossed | event                  |
//! |-------------|------------|---------------------------|------------------------|
//! | outside     | yes        | start: yes                | `CleanStart`           |
//! | outside     | yes        | start: no                 | `EarlyEntry`           |
//! | inside      | no         | finish: yes, had start    | `Completed`            |
//! | inside      | no         | finish: yes, no start     | `CleanExitNoStart`     |
//! | inside      | no         | finish: no                | `EarlyExit`            |
//!
//! Crossing times are interpolated linearly between the two samples using
//! the crossing's progress along the movement segment.

use tracing::trace;

use crate::config::TrackerConfig;
use crate::event::{EventKind, ZoneEvent};
use crate::geometry::Segment;
use crate::position::Position;
use crate::region::Region;
use crate::transit::{StartCrossing, TransitState, TransitStatus};

pub fn evaluate(
    previous: &Position,
    current: &Position,
    region: &Region,
    state: &TransitState,
    config: &TrackerConfig,
) -> (TransitState, Option<ZoneEvent>) {
    if !region.is_evaluable() {
        return (*state, None);
    }

    let was_in_bounds = state.in_bounds();
    let in_bounds = region.contains(current.location());
    // An interval that does not fit in i64 is stale like any other.
    let sample_interval = current.timestamp.checked_sub(previous.timestamp);

    let sample_interval = match sample_interval {
        Some(interval) if !is_stale(interval, config) => interval,
        _ => {
            trace!(
                region = %region.id(),
                vehicle = %current.vehicle_id,
                sample_interval = ?sample_interval,
                "sample gap unusable for zone timing"
            );
            return (resync(state, in_bounds), None);
        }
    };

    let path = Segment::new(previous.location(), current.location());

    match (was_in_bounds, in_bounds) {
        (false, true) => enter(previous, current, region, &path, sample_interval),
        (true, false) => exit(previous, current, region, state, &path, sample_interval),
        (true, true) => {
            let mut next = *state;
            next.distance_m += previous.location().distance_m(current.location());
            (next, None)
        }
        (false, false) => (*state, None),
    }
}

/// Linear interpolation of a crossing time between two samples.
pub fn interpolate_ts(from_ts: i64, to_ts: i64, progress: f64) -> f64 {
    let from = from_ts as f64;
    from + (to_ts as f64 - from) * progress
}

fn is_stale(sample_interval: i64, config: &TrackerConfig) -> bool {
    sample_interval < 0
        || config
            .max_sample_gap_secs
            .is_some_and(|max| sample_interval > max)
}

/// Follow containment without emitting anything. A vehicle found inside is
/// never credited with a start it was not seen making.
fn resync(state: &TransitState, in_bounds: bool) -> TransitState {
    match (state.in_bounds(), in_bounds) {
        (_, false) => TransitState::default(),
        (false, true) => TransitState {
            status: TransitStatus::InsidePendingNoStart,
            distance_m: 0.0,
        },
        (true, true) => *state,
    }
}

fn enter(
    previous: &Position,
    current: &Position,
    region: &Region,
    path: &Segment,
    sample_interval: i64,
) -> (TransitState, Option<ZoneEvent>) {
    let crossing = region.start_line().and_then(|line| path.intersect(&line));

    let (next, kind, ts) = match crossing {
        Some(crossing) => {
            let start_ts = interpolate_ts(previous.timestamp, current.timestamp, crossing.progress);
            let start = StartCrossing {
                position: crossing.position,
                progress: crossing.progress,
                timestamp: start_ts,
                sample_interval,
            };
            let next = TransitState {
                status: TransitStatus::InsideStarted(start),
                distance_m: crossing.position.distance_m(current.location()),
            };
            let kind = EventKind::CleanStart {
                start_ts,
                progress: crossing.progress,
            };
            (next, kind, start_ts)
        }
        None => {
            let next = TransitState {
                status: TransitStatus::InsidePendingNoStart,
                distance_m: 0.0,
            };
            (next, EventKind::EarlyEntry, current.timestamp as f64)
        }
    };

    (next, Some(build_event(region, current, kind, ts, sample_interval)))
}

fn exit(
    previous: &Position,
    current: &Position,
    region: &Region,
    state: &TransitState,
    path: &Segment,
    sample_interval: i64,
) -> (TransitState, Option<ZoneEvent>) {
    let crossing = region.finish_line().and_then(|line| path.intersect(&line));

    let (kind, ts) = match (crossing, state.start()) {
        (Some(crossing), Some(start)) => {
            let finish_ts = interpolate_ts(previous.timestamp, current.timestamp, crossing.progress);
            let duration = finish_ts - start.timestamp;
            let distance_m = state.distance_m + previous.location().distance_m(crossing.position);
            let avg_speed_mps = (duration > 0.0).then(|| distance_m / duration);
            let kind = EventKind::Completed {
                start_ts: start.timestamp,
                finish_ts,
                duration,
                progress: crossing.progress,
                start_sample_interval: start.sample_interval,
                distance_m,
                avg_speed_mps,
            };
            (kind, finish_ts)
        }
        (Some(crossing), None) => {
            let finish_ts = interpolate_ts(previous.timestamp, current.timestamp, crossing.progress);
            let kind = EventKind::CleanExitNoStart {
                finish_ts,
                progress: crossing.progress,
            };
            (kind, finish_ts)
        }
        (None, _) => (EventKind::EarlyExit, current.timestamp as f64),
    };

    (
        TransitState::default(),
        Some(build_event(region, current, kind, ts, sample_interval)),
    )
}

fn build_event(region: &Region, current: &Position, kind: EventKind, ts: f64, sample_interval: i64) -> ZoneEvent {
    ZoneEvent {
        region_id: region.id().clone(),
        vehicle_id: current.vehicle_id.clone(),
        route_id: current.route_id.clone(),
        kind,
        ts,
        sample_interval,
        position: current.clone(),
    }
}
