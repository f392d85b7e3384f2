mod fixtures;

use fixtures::{report, toft_track, TOFT_OUT, UNIT_SQUARE};
use zone_transit::config::TrackerConfig;
use zone_transit::engine::evaluate;
use zone_transit::event::{EventKind, Transition, ZoneEvent};
use zone_transit::position::Position;
use zone_transit::region::Region;
use zone_transit::transit::{TransitState, TransitStatus};

const EPS: f64 = 1e-6;

/// Run consecutive reports of one vehicle through one region.
fn run(region: &Region, reports: &[Position]) -> (TransitState, Vec<ZoneEvent>) {
    let config = TrackerConfig::default();
    let mut state = TransitState::default();
    let mut events = Vec::new();
    for pair in reports.windows(2) {
        let (next, event) = evaluate(&pair[0], &pair[1], region, &state, &config);
        state = next;
        events.extend(event);
    }
    (state, events)
}

#[test]
fn square_transit_is_timed_from_line_crossings() {
    let region = UNIT_SQUARE.region();
    let reports = [
        report("v", 100, -0.2, 0.5),
        report("v", 110, 0.3, 0.5),
        report("v", 120, 1.3, 0.5),
    ];

    let (state, events) = run(&region, &reports);
    assert_eq!(state, TransitState::default());
    assert_eq!(events.len(), 2);

    match events[0].kind {
        EventKind::CleanStart { start_ts, progress } => {
            assert!((start_ts - 104.0).abs() < EPS);
            assert!((progress - 0.4).abs() < EPS);
        }
        ref other => panic!("expected clean start, got {:?}", other),
    }
    assert_eq!(events[0].transition(), Transition::Entry);
    assert_eq!(events[0].sample_interval, 10);

    match events[1].kind {
        EventKind::Completed {
            start_ts,
            finish_ts,
            duration,
            progress,
            start_sample_interval,
            ..
        } => {
            assert!((start_ts - 104.0).abs() < EPS);
            assert!((finish_ts - 117.0).abs() < EPS);
            assert!((duration - 13.0).abs() < EPS);
            assert!((progress - 0.7).abs() < EPS);
            assert_eq!(start_sample_interval, 10);
        }
        ref other => panic!("expected completed, got {:?}", other),
    }
    assert!((events[1].ts - 117.0).abs() < EPS);
    assert_eq!(events[1].position.timestamp, 120);
}

#[test]
fn evaluation_is_deterministic() {
    let region = UNIT_SQUARE.region();
    let reports = [
        report("v", 100, -0.2, 0.5),
        report("v", 110, 0.3, 0.5),
        report("v", 120, 1.3, 0.5),
    ];
    assert_eq!(run(&region, &reports), run(&region, &reports));
}

#[test]
fn entry_through_side_is_early() {
    let region = UNIT_SQUARE.region();
    // Enters across the west edge (lng 0), not the south start edge.
    let reports = [report("v", 100, 0.5, -0.2), report("v", 110, 0.5, 0.3)];

    let (state, events) = run(&region, &reports);
    assert_eq!(state.status, TransitStatus::InsidePendingNoStart);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::EarlyEntry);
    assert_eq!(events[0].ts, 110.0);
}

#[test]
fn finish_without_start_is_clean_exit_no_start() {
    let region = UNIT_SQUARE.region();
    let reports = [
        report("v", 100, 0.5, -0.2),
        report("v", 110, 0.5, 0.3),
        report("v", 120, 1.5, 0.3),
    ];

    let (_, events) = run(&region, &reports);
    assert_eq!(events.len(), 2);
    match events[1].kind {
        EventKind::CleanExitNoStart { finish_ts, progress } => {
            assert!((progress - 0.5).abs() < EPS);
            assert!((finish_ts - 115.0).abs() < EPS);
        }
        ref other => panic!("expected clean exit without start, got {:?}", other),
    }
}

#[test]
fn exit_through_side_is_early_exit() {
    let region = UNIT_SQUARE.region();
    let reports = [
        report("v", 100, -0.2, 0.5),
        report("v", 110, 0.3, 0.5),
        report("v", 120, 0.3, 1.5),
    ];

    let (state, events) = run(&region, &reports);
    assert_eq!(state, TransitState::default());
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].kind, EventKind::EarlyExit);
    assert_eq!(events[1].transition(), Transition::Exit);
    assert_eq!(events[1].ts, 120.0);
}

#[test]
fn first_evaluation_inside_counts_as_entry() {
    let region = UNIT_SQUARE.region();
    let reports = [report("v", 100, 0.2, 0.5), report("v", 110, 0.3, 0.5)];

    let (_, events) = run(&region, &reports);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::EarlyEntry);
}

#[test]
fn toft_westbound_transit_completes() {
    let region = TOFT_OUT.region();
    let reports = toft_track("17147", 1000, &[0.0, -0.005, -0.012, -0.022]);

    let (state, events) = run(&region, &reports);
    assert_eq!(state, TransitState::default());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].region_id.as_str(), "madingley_road_out");
    assert_eq!(events[0].vehicle_id, "17147");

    match events[1].kind {
        EventKind::Completed {
            start_ts,
            finish_ts,
            duration,
            distance_m,
            avg_speed_mps,
            ..
        } => {
            assert!((start_ts - 1005.8758).abs() < 1e-3);
            assert!((finish_ts - 1026.6332).abs() < 1e-3);
            assert!((duration - 20.7574).abs() < 1e-3);
            assert!((distance_m - 1070.03).abs() < 1.0);
            let speed = avg_speed_mps.expect("positive duration has a speed");
            assert!((speed - 51.55).abs() < 0.1);
        }
        ref other => panic!("expected completed, got {:?}", other),
    }
}

#[test]
fn toft_eastbound_is_early_in_westbound_zone() {
    let region = TOFT_OUT.region();
    let reports = toft_track("17147", 1000, &[-0.022, -0.012, -0.005, 0.0]);

    let (_, events) = run(&region, &reports);
    let kinds: Vec<&str> = events.iter().map(|e| e.kind.name()).collect();
    assert_eq!(kinds, vec!["early_entry", "early_exit"]);
}

#[test]
fn reversed_toft_times_eastbound_transit() {
    let region = TOFT_OUT.region().reversed();
    assert_eq!(region.id().as_str(), "madingley_road_in");
    assert_eq!(region.name(), "Madingley Road IN");

    let reports = toft_track("17147", 1000, &[-0.022, -0.012, -0.005, 0.0]);
    let (_, events) = run(&region, &reports);
    assert_eq!(events.len(), 2);

    match events[1].kind {
        EventKind::Completed { start_ts, finish_ts, .. } => {
            assert!((start_ts - 1003.3668).abs() < 1e-3);
            assert!((finish_ts - 1024.1242).abs() < 1e-3);
        }
        ref other => panic!("expected completed, got {:?}", other),
    }
}

#[test]
fn gap_limit_suppresses_stale_transit() {
    let region = UNIT_SQUARE.region();
    let config = TrackerConfig::default().with_max_sample_gap(350);
    let reports = [
        report("v", 100, -0.2, 0.5),
        report("v", 110, 0.3, 0.5),
        report("v", 1000, 1.3, 0.5),
    ];

    let mut state = TransitState::default();
    let mut events = Vec::new();
    for pair in reports.windows(2) {
        let (next, event) = evaluate(&pair[0], &pair[1], &region, &state, &config);
        state = next;
        events.extend(event);
    }

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].kind, EventKind::CleanStart { .. }));
    assert_eq!(state, TransitState::default());
}
