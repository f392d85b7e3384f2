//! zone-transit core
//!
//! Detects vehicles crossing the start and finish lines of polygonal zones
//! from batches of position reports, and times their transits.

pub mod traits;
pub mod geometry;
pub mod region;
pub mod position;
pub mod transit;
pub mod event;
pub mod engine;
pub mod batch;
pub mod config;
pub mod feed;
