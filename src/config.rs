//! Tracker and service configuration.
//!
//! Every setting has a default and can be overridden through a `ZONE_*`
//! environment variable; unparsable values fall back to the default.

use std::env;
use std::path::PathBuf;

/// A conservative sample gap for feeds that report every minute or so.
pub const DEFAULT_MAX_SAMPLE_GAP_SECS: i64 = 350;

#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    /// Skip zone transitions whose two samples are further apart than this.
    /// `None` evaluates every consecutive pair.
    pub max_sample_gap_secs: Option<i64>,
    /// Evaluate regions of one batch concurrently.
    pub parallel_regions: bool,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        let max_sample_gap_secs = env::var("ZONE_MAX_SAMPLE_GAP_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0);

        Self {
            max_sample_gap_secs,
            parallel_regions: env_var_bool("ZONE_PARALLEL_REGIONS", false),
        }
    }

    pub fn with_max_sample_gap(mut self, secs: i64) -> Self {
        self.max_sample_gap_secs = Some(secs);
        self
    }

    pub fn with_parallel_regions(mut self, parallel: bool) -> Self {
        self.parallel_regions = parallel;
        self
    }
}

/// Settings for the `zone-tracker` binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub regions_path: PathBuf,
    /// Replay feed files from this directory instead of polling over HTTP.
    pub replay_dir: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            regions_path: PathBuf::from("regions.json"),
            replay_dir: None,
            poll_interval_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            regions_path: env::var("ZONE_REGIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.regions_path),
            replay_dir: env::var("ZONE_REPLAY_DIR").ok().map(PathBuf::from),
            poll_interval_secs: env_var_u64("ZONE_POLL_SECS", defaults.poll_interval_secs),
            log_level: env_var("ZONE_LOG_LEVEL", defaults.log_level),
        }
    }
}

pub(crate) fn env_var(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

pub(crate) fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_var_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        })
        .unwrap_or(default)
}
