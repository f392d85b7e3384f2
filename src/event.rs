//! Classified zone events emitted by the engine.

use serde::Serialize;

use crate::position::Position;
use crate::region::RegionId;

/// Which containment change produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Entered across the start line.
    CleanStart { start_ts: f64, progress: f64 },
    /// Entered without crossing the start line.
    EarlyEntry,
    /// Left across the finish line after a clean start.
    Completed {
        start_ts: f64,
        finish_ts: f64,
        duration: f64,
        /// Fraction along the exit movement at which the finish line was crossed.
        progress: f64,
        start_sample_interval: i64,
        distance_m: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        avg_speed_mps: Option<f64>,
    },
    /// Left across the finish line without a recorded start.
    CleanExitNoStart { finish_ts: f64, progress: f64 },
    /// Left without crossing the finish line.
    EarlyExit,
}

impl EventKind {
    pub fn transition(&self) -> Transition {
        match self {
            EventKind::CleanStart { .. } | EventKind::EarlyEntry => Transition::Entry,
            EventKind::Completed { .. } | EventKind::CleanExitNoStart { .. } | EventKind::EarlyExit => {
                Transition::Exit
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CleanStart { .. } => "clean_start",
            EventKind::EarlyEntry => "early_entry",
            EventKind::Completed { .. } => "completed",
            EventKind::CleanExitNoStart { .. } => "clean_exit_no_start",
            EventKind::EarlyExit => "early_exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneEvent {
    pub region_id: RegionId,
    pub vehicle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(flatten)]
    pub kind: EventKind,
    /// Event instant: the interpolated line crossing when there is one,
    /// otherwise the timestamp of the triggering sample.
    pub ts: f64,
    /// Seconds between the previous and the triggering sample.
    pub sample_interval: i64,
    /// The report that triggered the event.
    pub position: Position,
}

impl ZoneEvent {
    pub fn transition(&self) -> Transition {
        self.kind.transition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(EventKind::EarlyEntry.transition(), Transition::Entry);
        assert_eq!(
            EventKind::CleanStart {
                start_ts: 1.0,
                progress: 0.5
            }
            .transition(),
            Transition::Entry
        );
        assert_eq!(EventKind::EarlyExit.transition(), Transition::Exit);
        assert_eq!(
            EventKind::CleanExitNoStart {
                finish_ts: 1.0,
                progress: 0.5
            }
            .transition(),
            Transition::Exit
        );
    }

    #[test]
    fn test_serialized_shape() {
        let event = ZoneEvent {
            region_id: RegionId::new("toft"),
            vehicle_id: "17147".to_string(),
            route_id: Some("U".to_string()),
            kind: EventKind::CleanStart {
                start_ts: 104.0,
                progress: 0.4,
            },
            ts: 104.0,
            sample_interval: 10,
            position: Position::new("17147", 110, 52.185, -0.005),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "clean_start");
        assert_eq!(value["region_id"], "toft");
        assert_eq!(value["start_ts"], 104.0);
        assert_eq!(value["position"]["timestamp"], 110);
    }
}
