use std::sync::atomic::{AtomicU64, Ordering};

use foundation::math::Vec2;
use serde_json::Value;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// Stable identifier handed out by a [`MarkerCollection`] on insertion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    Polygon,
}

impl GeometryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point geometry. `coordinates` is (longitude, latitude) before projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinates: Vec2,
    pub properties: Option<Value>,
}

impl Marker {
    pub fn new(coordinates: Vec2) -> Self {
        Self {
            coordinates,
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Any geometry a caller may try to put on a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Marker(Marker),
    MultiPoint(Vec<Vec2>),
    LineString(Vec<Vec2>),
    Polygon(Vec<Vec<Vec2>>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Marker(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Marker(_))
    }

    pub fn into_marker(self) -> Option<Marker> {
        match self {
            Geometry::Marker(marker) => Some(marker),
            _ => None,
        }
    }
}

impl From<Marker> for Geometry {
    fn from(marker: Marker) -> Self {
        Geometry::Marker(marker)
    }
}

/// Identifies one state of one marker collection.
///
/// `epoch` is unique per collection instance (clones get a fresh one), `version` counts
/// mutations within that instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    pub epoch: u64,
    pub version: u64,
}

/// Ordered marker storage with a version counter bumped on every mutation.
///
/// Anything derived from the markers (point snapshots, cluster grids) records the
/// [`Revision`] it was computed from and is stale once the collection moves on or a
/// different collection is offered.
#[derive(Debug)]
pub struct MarkerCollection {
    entries: Vec<(MarkerId, Marker)>,
    next_id: u64,
    epoch: u64,
    version: u64,
}

impl Default for MarkerCollection {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            epoch: next_epoch(),
            version: 0,
        }
    }
}

impl Clone for MarkerCollection {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            next_id: self.next_id,
            epoch: next_epoch(),
            version: self.version,
        }
    }
}

impl MarkerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: Marker) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, marker));
        self.version += 1;
        id
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let idx = self.entries.iter().position(|(k, _)| *k == id)?;
        self.version += 1;
        Some(self.entries.remove(idx).1)
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.version += 1;
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.entries.iter().find(|(k, _)| *k == id).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.entries.iter().map(|(id, m)| (*id, m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn revision(&self) -> Revision {
        Revision {
            epoch: self.epoch,
            version: self.version,
        }
    }
}
