use foundation::math::Vec2;

use super::ZoomScale;
use super::grid::{CellKey, Grid};

/// Relation from a cluster to the cluster occupying the same area in an adjacent zoom level.
///
/// Resolved through the cache that owns both grids; it does not keep the other grid alive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ParentLink {
    pub zoom: i32,
    pub key: CellKey,
}

/// An already computed grid that new clusters link against.
#[derive(Debug, Copy, Clone)]
pub struct PriorGrid<'a> {
    pub zoom: i32,
    pub grid: &'a Grid,
}

impl<'a> PriorGrid<'a> {
    pub fn new(zoom: i32, grid: &'a Grid) -> Self {
        Self { zoom, grid }
    }
}

/// The neighbouring zoom level with the coarser resolution.
///
/// That is `zoom - 1` on the usual maps whose resolution shrinks as zoom grows.
pub fn adjacent_zoom<S: ZoomScale + ?Sized>(zoom: i32, scale: &S) -> i32 {
    let coarse_first = match (
        scale.resolution(scale.min_zoom()),
        scale.resolution(scale.max_zoom()),
    ) {
        (Some(at_min), Some(at_max)) => at_min > at_max,
        _ => true,
    };
    if coarse_first { zoom - 1 } else { zoom + 1 }
}

/// Link for a point at `position`, if the matching cell of `prior` holds a cluster.
///
/// Single hop only: the parent's own parent is never followed.
pub fn link_parent(position: Vec2, prior: PriorGrid<'_>) -> Option<ParentLink> {
    let cell = prior.grid.cell_size();
    if !cell.is_finite() || cell <= 0.0 {
        return None;
    }
    let key = prior.grid.key_for(position);
    prior.grid.get(&key).map(|_| ParentLink {
        zoom: prior.zoom,
        key,
    })
}
