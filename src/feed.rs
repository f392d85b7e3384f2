//! Position feed adapters.
//!
//! Decoding of the CSV and JSON vehicle-position feeds, plus the two
//! [`PositionSource`] implementations used by the tracker binary: a blocking
//! HTTP poller and a directory replayer.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{env_var, env_var_u64};
use crate::position::Position;
use crate::traits::PositionSource;

/// Columns a CSV feed must carry, by accepted header names.
const REQUIRED_COLUMNS: [(&str, &[&str]); 4] = [
    ("vehicle id", &["id", "vehicle_id", "acp_id"]),
    ("timestamp", &["timestamp", "acp_ts"]),
    ("latitude", &["latitude", "acp_lat"]),
    ("longitude", &["longitude", "acp_lng"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Csv,
    Json,
}

impl FeedFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(FeedFormat::Csv),
            "json" => Some(FeedFormat::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub format: FeedFormat,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/vehicle_positions.csv".to_string(),
            format: FeedFormat::Csv,
            timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let format = std::env::var("ZONE_FEED_FORMAT")
            .ok()
            .and_then(|name| FeedFormat::from_name(&name))
            .unwrap_or(defaults.format);

        Self {
            url: env_var("ZONE_FEED_URL", defaults.url),
            format,
            timeout_secs: env_var_u64("ZONE_FEED_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }
}

#[derive(Debug)]
pub enum FeedError {
    Io(io::Error),
    Http(reqwest::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    MissingColumn(&'static str),
}

impl From<io::Error> for FeedError {
    fn from(err: io::Error) -> Self {
        FeedError::Io(err)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err)
    }
}

impl From<csv::Error> for FeedError {
    fn from(err: csv::Error) -> Self {
        FeedError::Csv(err)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Json(err)
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Io(err) => write!(f, "feed io error: {}", err),
            FeedError::Http(err) => write!(f, "feed request failed: {}", err),
            FeedError::Csv(err) => write!(f, "invalid csv feed: {}", err),
            FeedError::Json(err) => write!(f, "invalid json feed: {}", err),
            FeedError::MissingColumn(column) => write!(f, "csv feed has no {} column", column),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Io(err) => Some(err),
            FeedError::Http(err) => Some(err),
            FeedError::Csv(err) => Some(err),
            FeedError::Json(err) => Some(err),
            FeedError::MissingColumn(_) => None,
        }
    }
}

/// One feed record as it appears on the wire, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PositionRecord {
    vehicle_id: Option<String>,
    id: Option<String>,
    timestamp: Option<i64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    label: Option<String>,
    route_id: Option<String>,
    trip_id: Option<String>,
    bearing: Option<f64>,
    current_stop_sequence: Option<i64>,
    stop_id: Option<String>,
    acp_id: Option<String>,
    acp_ts: Option<i64>,
    acp_lat: Option<f64>,
    acp_lng: Option<f64>,
}

impl PositionRecord {
    /// Normalised `acp_*` fields win over the raw feed fields.
    fn into_position(self) -> Option<Position> {
        let vehicle_id = [self.acp_id, self.vehicle_id, self.id]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())?;
        let timestamp = self.acp_ts.or(self.timestamp)?;
        let latitude = self.acp_lat.or(self.latitude)?;
        let longitude = self.acp_lng.or(self.longitude)?;

        Some(Position {
            vehicle_id,
            timestamp,
            latitude,
            longitude,
            label: self.label,
            route_id: self.route_id,
            trip_id: self.trip_id,
            bearing: self.bearing,
            current_stop_sequence: self.current_stop_sequence,
            stop_id: self.stop_id,
        })
    }
}

/// Decode a header-keyed CSV feed. Rows that cannot be read or lack a
/// vehicle id, timestamp or coordinates are skipped.
pub fn decode_csv(text: &str) -> Result<Vec<Position>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    for (column, names) in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| names.contains(&header)) {
            return Err(FeedError::MissingColumn(column));
        }
    }

    let mut positions = Vec::new();
    for (row, record) in reader.deserialize::<PositionRecord>().enumerate() {
        match record {
            Ok(record) => match record.into_position() {
                Some(position) => positions.push(position),
                None => debug!(row, "csv row without id, timestamp or coordinates"),
            },
            Err(err) => debug!(row, error = %err, "skipping unreadable csv row"),
        }
    }
    Ok(positions)
}

/// Decode a JSON feed message.
pub fn decode_json(text: &str) -> Result<Vec<Position>, FeedError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(decode_json_value(value))
}

/// Records are read from `entities`, then `request_data`, then a bare array.
pub fn decode_json_value(value: Value) -> Vec<Position> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut message) => match message
            .remove("entities")
            .or_else(|| message.remove("request_data"))
        {
            Some(Value::Array(records)) => records,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<PositionRecord>(record) {
            Ok(record) => record.into_position(),
            Err(err) => {
                debug!(index, error = %err, "skipping unreadable json record");
                None
            }
        })
        .collect()
}

pub fn decode(text: &str, format: FeedFormat) -> Result<Vec<Position>, FeedError> {
    match format {
        FeedFormat::Csv => decode_csv(text),
        FeedFormat::Json => decode_json(text),
    }
}

/// Polls a vehicle-position feed over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    config: FeedConfig,
    client: reqwest::blocking::Client,
}

impl HttpFeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn fetch(&self) -> Result<Vec<Position>, FeedError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()?
            .error_for_status()?;

        match self.config.format {
            FeedFormat::Csv => decode_csv(&response.text()?),
            FeedFormat::Json => Ok(decode_json_value(response.json::<Value>()?)),
        }
    }
}

impl PositionSource for HttpFeedClient {
    fn fetch_batch(&mut self) -> Result<Option<Vec<Position>>, FeedError> {
        self.fetch().map(Some)
    }
}

/// Replays a directory of recorded feed files, one file per batch, in file
/// name order. Files other than `.csv` and `.json` are ignored.
#[derive(Debug)]
pub struct ReplaySource {
    files: VecDeque<PathBuf>,
}

impl ReplaySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && FeedFormat::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self {
            files: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl PositionSource for ReplaySource {
    fn fetch_batch(&mut self) -> Result<Option<Vec<Position>>, FeedError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        let format = FeedFormat::from_path(&path).unwrap_or(FeedFormat::Csv);
        let text = fs::read_to_string(&path)?;
        debug!(file = %path.display(), "replaying feed file");
        decode(&text, format).map(Some)
    }
}
