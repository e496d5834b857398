use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::math::Projection;
use tracing::{debug, trace, warn};

use super::grid::{Cluster, Grid, build_grid};
use super::link::{PriorGrid, adjacent_zoom};
use super::points::PointSnapshot;
use super::{GridReuse, ZoomScale, cell_size};
use crate::markers::MarkerCollection;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Grids binned from scratch.
    pub builds: u64,
    /// Zoom levels that took the adjacent level's grid as-is.
    pub aliases: u64,
    /// Reads answered from the cache.
    pub hits: u64,
    /// Marker snapshots taken.
    pub snapshots: u64,
}

/// One grid per zoom level, all computed from a single marker snapshot.
///
/// The snapshot is tied to [`MarkerCollection::revision`]: any insertion or removal, or a
/// different collection (clones included), makes the next read re-project the markers and
/// drop every cached grid.
///
/// Grids are shared as `Rc`; a zoom level reusing its neighbour's grid holds the same `Rc`.
/// Not `Sync`, one cache belongs to one renderer.
#[derive(Debug)]
pub struct ZoomGridCache {
    max_cluster_radius: f64,
    reuse: GridReuse,
    snapshot: Option<PointSnapshot>,
    grids: BTreeMap<i32, Rc<Grid>>,
    stats: CacheStats,
}

impl ZoomGridCache {
    pub fn new(max_cluster_radius: f64, reuse: GridReuse) -> Self {
        Self {
            max_cluster_radius,
            reuse,
            snapshot: None,
            grids: BTreeMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn max_cluster_radius(&self) -> f64 {
        self.max_cluster_radius
    }

    /// Changing the radius changes every cell size, so all grids are dropped.
    pub fn set_max_cluster_radius(&mut self, max_cluster_radius: f64) {
        if max_cluster_radius != self.max_cluster_radius {
            self.max_cluster_radius = max_cluster_radius;
            self.grids.clear();
        }
    }

    pub fn reuse(&self) -> GridReuse {
        self.reuse
    }

    /// Grids already aliased under the old policy may not satisfy the new one, so all are dropped.
    pub fn set_reuse(&mut self, reuse: GridReuse) {
        if reuse != self.reuse {
            self.reuse = reuse;
            self.grids.clear();
        }
    }

    /// Grid for `zoom`, built on first request and cached until the markers change.
    ///
    /// Repeated reads for the same zoom and marker revision return the same `Rc`.
    pub fn grid<S, P>(
        &mut self,
        zoom: i32,
        markers: &MarkerCollection,
        scale: &S,
        projection: &P,
    ) -> Rc<Grid>
    where
        S: ZoomScale + ?Sized,
        P: Projection + ?Sized,
    {
        self.refresh_snapshot(markers, projection);

        if let Some(grid) = self.grids.get(&zoom) {
            self.stats.hits += 1;
            trace!(zoom, "cluster grid cache hit");
            return Rc::clone(grid);
        }

        let grid = self.resolve(zoom, scale);
        self.grids.insert(zoom, Rc::clone(&grid));
        grid
    }

    fn refresh_snapshot<P: Projection + ?Sized>(
        &mut self,
        markers: &MarkerCollection,
        projection: &P,
    ) {
        if self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.is_current_for(markers))
        {
            return;
        }
        if !self.grids.is_empty() {
            debug!(
                dropped = self.grids.len(),
                "marker collection changed, dropping cluster grids"
            );
            self.grids.clear();
        }
        let snapshot = PointSnapshot::capture(markers, projection);
        self.stats.snapshots += 1;
        debug!(
            points = snapshot.len(),
            epoch = snapshot.revision().epoch,
            version = snapshot.revision().version,
            "captured marker snapshot"
        );
        self.snapshot = Some(snapshot);
    }

    fn resolve<S: ZoomScale + ?Sized>(&mut self, zoom: i32, scale: &S) -> Rc<Grid> {
        let Some(resolution) = scale.resolution(zoom) else {
            warn!(zoom, "zoom level has no resolution, nothing to cluster");
            return Rc::new(Grid::empty(0.0));
        };
        let cell = cell_size(resolution, self.max_cluster_radius);

        let adjacent = adjacent_zoom(zoom, scale);
        let prior = self.grids.get(&adjacent).cloned();
        // Markers skipped at capture never reach a grid, so compare against the snapshot.
        let point_count = self.snapshot.as_ref().map_or(0, PointSnapshot::len);
        if let Some(prior) = &prior
            && self.reuse.allows(prior, point_count, cell)
        {
            self.stats.aliases += 1;
            debug!(zoom, adjacent, "reusing adjacent cluster grid");
            return Rc::clone(prior);
        }

        let (points, extent) = match &self.snapshot {
            Some(snapshot) => (snapshot.points(), snapshot.extent()),
            None => (&[][..], None),
        };
        let grid = build_grid(
            points,
            extent,
            cell,
            prior.as_deref().map(|g| PriorGrid::new(adjacent, g)),
        );
        self.stats.builds += 1;
        debug!(
            zoom,
            cell_size = cell,
            clusters = grid.len(),
            points = grid.point_count(),
            "built cluster grid"
        );
        Rc::new(grid)
    }

    pub fn cached(&self, zoom: i32) -> Option<&Rc<Grid>> {
        self.grids.get(&zoom)
    }

    /// Follows a cluster's parent link into the adjacent grid, if that grid is still cached.
    pub fn parent_of(&self, cluster: &Cluster) -> Option<&Cluster> {
        let link = cluster.parent?;
        self.grids.get(&link.zoom)?.get(&link.key)
    }

    pub fn snapshot(&self) -> Option<&PointSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.grids.clear();
    }
}
