//! Test fixtures for zone-transit.
//!
//! Provides:
//! - Real Cambridgeshire zone outlines (road segments around Cambridge)
//! - Builders for regions and position reports

pub mod cambridge_zones;

pub use cambridge_zones::*;
