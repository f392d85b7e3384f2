//! Zones ("regions") that vehicles are timed across.
//!
//! A region is a polygon whose first edge (vertex 0 to vertex 1) is the start
//! line and whose edge `finish_index` (wrapping to vertex 0 after the last
//! vertex) is the finish line.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{self, BoundingBox, LatLng, Segment};

/// Fewer vertices than this and a region is not evaluated.
pub const MIN_VERTICES: usize = 3;

/// Suffix swaps applied to ids and names when a region is reversed.
const REVERSE_SUFFIXES: &[(&str, &str)] = &[("_out", "_in"), ("_in", "_out"), (" IN", " OUT"), (" OUT", " IN")];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialized form of a region, as stored in a zone definition file.
///
/// Also reads the two legacy layouts: map-editor bounds (`name`, `path`,
/// `finish_index`, `checked`, no id) and zone module configs (`zone.*` keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Falls back to `name` when empty or absent.
    #[serde(default, alias = "zone.id")]
    pub id: String,
    #[serde(default, alias = "zone.name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "zone.path")]
    pub path: Vec<LatLng>,
    #[serde(alias = "zone.finish_index")]
    pub finish_index: usize,
    #[serde(default = "default_active", alias = "checked")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug)]
pub enum RegionError {
    Io(io::Error),
    Json(serde_json::Error),
    EmptyId,
    DuplicateId(String),
    NonFiniteVertex { id: String, index: usize },
    FinishIndexOutOfRange { id: String, finish_index: usize, vertices: usize },
}

impl From<io::Error> for RegionError {
    fn from(err: io::Error) -> Self {
        RegionError::Io(err)
    }
}

impl From<serde_json::Error> for RegionError {
    fn from(err: serde_json::Error) -> Self {
        RegionError::Json(err)
    }
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Io(err) => write!(f, "reading region file: {}", err),
            RegionError::Json(err) => write!(f, "parsing region definitions: {}", err),
            RegionError::EmptyId => write!(f, "region has an empty id"),
            RegionError::DuplicateId(id) => write!(f, "region id {} defined more than once", id),
            RegionError::NonFiniteVertex { id, index } => {
                write!(f, "region {} vertex {} is not a finite coordinate", id, index)
            }
            RegionError::FinishIndexOutOfRange {
                id,
                finish_index,
                vertices,
            } => write!(
                f,
                "region {} finish_index {} out of range for {} vertices",
                id, finish_index, vertices
            ),
        }
    }
}

impl std::error::Error for RegionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegionError::Io(err) => Some(err),
            RegionError::Json(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    name: String,
    vertices: Vec<LatLng>,
    finish_index: usize,
    bounds: Option<BoundingBox>,
    active: bool,
}

impl Region {
    /// An active region named after its id.
    pub fn new(id: impl Into<String>, vertices: Vec<LatLng>, finish_index: usize) -> Self {
        let id = id.into();
        let bounds = BoundingBox::from_vertices(&vertices);
        Self {
            name: id.clone(),
            id: RegionId(id),
            vertices,
            finish_index,
            bounds,
            active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn from_config(mut config: RegionConfig) -> Result<Self, RegionError> {
        if config.id.is_empty() {
            config.id = config.name.clone().unwrap_or_default();
        }
        if config.id.is_empty() {
            return Err(RegionError::EmptyId);
        }
        if let Some(index) = config.path.iter().position(|vertex| !vertex.is_finite()) {
            return Err(RegionError::NonFiniteVertex { id: config.id, index });
        }
        if !config.path.is_empty() && config.finish_index >= config.path.len() {
            return Err(RegionError::FinishIndexOutOfRange {
                finish_index: config.finish_index,
                vertices: config.path.len(),
                id: config.id,
            });
        }

        let mut region = Region::new(config.id, config.path, config.finish_index);
        if let Some(name) = config.name {
            region.name = name;
        }
        region.active = config.active;
        Ok(region)
    }

    pub fn to_config(&self) -> RegionConfig {
        RegionConfig {
            id: self.id.0.clone(),
            name: Some(self.name.clone()),
            path: self.vertices.clone(),
            finish_index: self.finish_index,
            active: self.active,
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    pub fn finish_index(&self) -> usize {
        self.finish_index
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active and with enough vertices to form a polygon.
    pub fn is_evaluable(&self) -> bool {
        self.active && self.vertices.len() >= MIN_VERTICES
    }

    /// Edge from vertex 0 to vertex 1.
    pub fn start_line(&self) -> Option<Segment> {
        self.edge(0)
    }

    /// Edge from vertex `finish_index` to the following vertex, wrapping.
    pub fn finish_line(&self) -> Option<Segment> {
        self.edge(self.finish_index)
    }

    fn edge(&self, index: usize) -> Option<Segment> {
        let n = self.vertices.len();
        if n < 2 {
            return None;
        }
        let from = self.vertices[index % n];
        let to = self.vertices[(index + 1) % n];
        Some(Segment::new(from, to))
    }

    pub fn contains(&self, point: LatLng) -> bool {
        match &self.bounds {
            Some(bounds) if self.vertices.len() >= MIN_VERTICES => geometry::contains(point, &self.vertices, bounds),
            _ => false,
        }
    }

    pub fn push_vertex(&mut self, vertex: LatLng) {
        self.vertices.push(vertex);
        self.bounds = BoundingBox::from_vertices(&self.vertices);
    }

    pub fn set_vertices(&mut self, vertices: Vec<LatLng>) {
        self.bounds = BoundingBox::from_vertices(&vertices);
        self.vertices = vertices;
    }

    pub fn set_finish_index(&mut self, finish_index: usize) {
        self.finish_index = finish_index;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The same zone timed in the opposite direction.
    ///
    /// The vertex ring is rotated so the finish edge becomes edge 0 (the new
    /// start line) and `finish_index` points at the old start edge. Trailing
    /// `_in`/`_out` and ` IN`/` OUT` in the id and name are swapped.
    pub fn reversed(&self) -> Region {
        let n = self.vertices.len();
        let (vertices, finish_index) = if n == 0 {
            (Vec::new(), 0)
        } else {
            let shift = self.finish_index % n;
            let mut vertices = self.vertices.clone();
            vertices.rotate_left(shift);
            (vertices, (n - shift) % n)
        };

        Region {
            id: RegionId(swap_direction_suffix(&self.id.0)),
            name: swap_direction_suffix(&self.name),
            bounds: BoundingBox::from_vertices(&vertices),
            vertices,
            finish_index,
            active: self.active,
        }
    }
}

fn swap_direction_suffix(value: &str) -> String {
    for (from, to) in REVERSE_SUFFIXES {
        if let Some(stem) = value.strip_suffix(from) {
            return format!("{}{}", stem, to);
        }
    }
    warn!(value, "no direction suffix to swap on reversed region");
    value.to_string()
}

/// Zone definition file: a bare array, `{ "regions": [...] }`, a zone
/// module config `{ "options": { "config": {...} } }`, or a single region.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegionFile {
    List(Vec<RegionConfig>),
    Wrapped { regions: Vec<RegionConfig> },
    Module { options: ModuleOptions },
    Single(RegionConfig),
}

#[derive(Deserialize)]
struct ModuleOptions {
    config: RegionConfig,
}

/// Regions keyed by id, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region, replacing (in place) any region with the same id.
    pub fn insert(&mut self, region: Region) -> Option<Region> {
        match self.regions.iter_mut().find(|existing| existing.id == region.id) {
            Some(existing) => Some(std::mem::replace(existing, region)),
            None => {
                self.regions.push(region);
                None
            }
        }
    }

    pub fn remove(&mut self, id: &RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|region| &region.id == id)?;
        Some(self.regions.remove(index))
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| &region.id == id)
    }

    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| &region.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Regions the engine evaluates, in order.
    pub fn evaluable(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|region| region.is_evaluable())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn from_configs(configs: Vec<RegionConfig>) -> Result<Self, RegionError> {
        let mut store = RegionStore::new();
        for config in configs {
            let region = Region::from_config(config)?;
            if store.get(region.id()).is_some() {
                return Err(RegionError::DuplicateId(region.id.0));
            }
            store.regions.push(region);
        }
        Ok(store)
    }

    pub fn load_json(text: &str) -> Result<Self, RegionError> {
        let configs = match serde_json::from_str::<RegionFile>(text)? {
            RegionFile::List(configs) => configs,
            RegionFile::Wrapped { regions } => regions,
            RegionFile::Module { options } => vec![options.config],
            RegionFile::Single(config) => vec![config],
        };
        Self::from_configs(configs)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let text = fs::read_to_string(path)?;
        Self::load_json(&text)
    }
}

impl FromIterator<Region> for RegionStore {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut store = RegionStore::new();
        for region in iter {
            store.insert(region);
        }
        store
    }
}
