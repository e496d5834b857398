use std::collections::BTreeMap;
use std::fmt;

use foundation::Aabb2;
use foundation::math::Vec2;
use tracing::warn;

use super::link::{ParentLink, PriorGrid, link_parent};
use super::points::ClusterPoint;

/// Integer cell indices of a point within a grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Cell holding `position` in a grid anchored at `origin`. `cell_size` must be positive.
    pub fn locate(position: Vec2, origin: Vec2, cell_size: f64) -> Self {
        Self {
            x: ((position.x - origin.x) / cell_size).floor() as i64,
            y: ((position.y - origin.y) / cell_size).floor() as i64,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub sum: Vec2,
    /// Always `sum / count`.
    pub center: Vec2,
    pub count: usize,
    /// First point binned into the cell.
    pub representative: ClusterPoint,
    pub parent: Option<ParentLink>,
}

impl Cluster {
    fn seed(point: &ClusterPoint, parent: Option<ParentLink>) -> Self {
        Self {
            sum: point.position,
            center: point.position,
            count: 1,
            representative: *point,
            parent,
        }
    }

    fn absorb(&mut self, point: &ClusterPoint) {
        self.sum += point.position;
        self.count += 1;
        self.center = self.sum.scale(1.0 / self.count as f64);
    }

    /// A lone point is drawn as its own marker rather than as an aggregate.
    pub fn is_single(&self) -> bool {
        self.count == 1
    }
}

/// All clusters of one zoom level, keyed by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cell_size: f64,
    origin: Vec2,
    clusters: BTreeMap<CellKey, Cluster>,
    point_count: usize,
}

impl Grid {
    pub fn empty(cell_size: f64) -> Self {
        Self {
            cell_size,
            origin: Vec2::ZERO,
            clusters: BTreeMap::new(),
            point_count: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Minimum corner of the marker extent the cells are counted from.
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn key_for(&self, position: Vec2) -> CellKey {
        CellKey::locate(position, self.origin, self.cell_size)
    }

    pub fn get(&self, key: &CellKey) -> Option<&Cluster> {
        self.clusters.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &Cluster)> {
        self.clusters.iter()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Number of points binned into this grid, the sum of all cluster counts.
    pub fn point_count(&self) -> usize {
        self.point_count
    }
}

/// Bins `points` into square cells of `cell_size` counted from the minimum corner of `extent`.
///
/// New clusters are linked to the cell they fall into in `prior`, when one is given and that
/// cell is occupied. Without an extent, or with a degenerate cell size, the grid is empty.
pub fn build_grid(
    points: &[ClusterPoint],
    extent: Option<Aabb2>,
    cell_size: f64,
    prior: Option<PriorGrid<'_>>,
) -> Grid {
    let Some(extent) = extent else {
        return Grid::empty(cell_size);
    };
    if !cell_size.is_finite() || cell_size <= 0.0 {
        warn!(cell_size, "degenerate cluster cell size, nothing to cluster");
        return Grid::empty(cell_size);
    }

    let origin = extent.min_corner();
    let mut clusters: BTreeMap<CellKey, Cluster> = BTreeMap::new();
    for point in points {
        let key = CellKey::locate(point.position, origin, cell_size);
        match clusters.get_mut(&key) {
            Some(cluster) => cluster.absorb(point),
            None => {
                let parent = prior.and_then(|p| link_parent(point.position, p));
                clusters.insert(key, Cluster::seed(point, parent));
            }
        }
    }

    Grid {
        cell_size,
        origin,
        clusters,
        point_count: points.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CellKey, Grid, build_grid};
    use crate::cluster::points::ClusterPoint;
    use crate::markers::MarkerId;
    use foundation::Aabb2;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn points(coords: &[(f64, f64)]) -> Vec<ClusterPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| ClusterPoint {
                position: Vec2::new(*x, *y),
                marker: MarkerId(i as u64),
            })
            .collect()
    }

    fn extent_of(points: &[ClusterPoint]) -> Option<Aabb2> {
        points
            .iter()
            .map(|p| Aabb2::from_point(p.position))
            .reduce(Aabb2::combine)
    }

    fn summary(grid: &Grid) -> Vec<(String, usize, Vec2)> {
        grid.iter()
            .map(|(k, c)| (k.to_string(), c.count, c.center))
            .collect()
    }

    #[test]
    fn bins_points_into_cells() {
        let pts = points(&[(0.0, 0.0), (1.0, 1.0), (50.0, 50.0)]);
        let grid = build_grid(&pts, extent_of(&pts), 10.0, None);

        assert_eq!(
            summary(&grid),
            vec![
                ("0_0".to_string(), 2, Vec2::new(0.5, 0.5)),
                ("5_5".to_string(), 1, Vec2::new(50.0, 50.0)),
            ]
        );
        assert_eq!(grid.point_count(), 3);
        assert_eq!(grid.get(&CellKey::new(0, 0)).unwrap().representative.marker, MarkerId(0));
        assert!(grid.get(&CellKey::new(5, 5)).unwrap().is_single());
    }

    #[test]
    fn counts_add_up_to_point_total() {
        let coords: Vec<(f64, f64)> = (0..200)
            .map(|i| ((i * 37 % 101) as f64 * 1.7, (i * 53 % 97) as f64 * 2.3))
            .collect();
        let pts = points(&coords);
        let grid = build_grid(&pts, extent_of(&pts), 25.0, None);

        let total: usize = grid.clusters().map(|c| c.count).sum();
        assert_eq!(total, pts.len());
        assert_eq!(grid.point_count(), pts.len());
    }

    #[test]
    fn centers_are_member_means() {
        let coords: Vec<(f64, f64)> = (0..60)
            .map(|i| ((i * 13 % 41) as f64, (i * 7 % 29) as f64))
            .collect();
        let pts = points(&coords);
        let extent = extent_of(&pts);
        let grid = build_grid(&pts, extent, 8.0, None);

        for (key, cluster) in grid.iter() {
            let members: Vec<&ClusterPoint> = pts
                .iter()
                .filter(|p| grid.key_for(p.position) == *key)
                .collect();
            assert_eq!(members.len(), cluster.count);
            let n = members.len() as f64;
            let mean_x = members.iter().map(|p| p.position.x).sum::<f64>() / n;
            let mean_y = members.iter().map(|p| p.position.y).sum::<f64>() / n;
            assert!((cluster.center.x - mean_x).abs() < 1e-9);
            assert!((cluster.center.y - mean_y).abs() < 1e-9);
        }
    }

    #[test]
    fn same_input_gives_same_grid() {
        let pts = points(&[(3.0, 9.0), (14.0, 2.0), (15.5, 2.5), (40.0, 41.0)]);
        let a = build_grid(&pts, extent_of(&pts), 5.0, None);
        let b = build_grid(&pts, extent_of(&pts), 5.0, None);
        assert_eq!(a, b);
    }

    #[test]
    fn insertion_order_only_changes_representative() {
        let forward = points(&[(0.0, 0.0), (1.0, 2.0), (30.0, 30.0)]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = build_grid(&forward, extent_of(&forward), 10.0, None);
        let b = build_grid(&reversed, extent_of(&reversed), 10.0, None);

        let keys_a: Vec<_> = a.iter().map(|(k, c)| (*k, c.count)).collect();
        let keys_b: Vec<_> = b.iter().map(|(k, c)| (*k, c.count)).collect();
        assert_eq!(keys_a, keys_b);

        let key = CellKey::new(0, 0);
        let ca = a.get(&key).unwrap();
        let cb = b.get(&key).unwrap();
        assert!((ca.center.x - cb.center.x).abs() < 1e-12);
        assert!((ca.center.y - cb.center.y).abs() < 1e-12);
        assert_eq!(ca.representative.marker, MarkerId(0));
        assert_eq!(cb.representative.marker, MarkerId(1));
    }

    #[test]
    fn larger_cells_never_add_clusters() {
        let coords: Vec<(f64, f64)> = (0..150)
            .map(|i| ((i * 31 % 89) as f64 * 3.1, (i * 17 % 83) as f64 * 2.9))
            .collect();
        let pts = points(&coords);
        let extent = extent_of(&pts);

        let mut previous = usize::MAX;
        for radius in [5.0, 10.0, 20.0, 40.0, 80.0, 160.0] {
            let grid = build_grid(&pts, extent, 2.0 * radius, None);
            assert!(grid.len() <= previous, "radius {radius} produced more clusters");
            previous = grid.len();
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn no_extent_means_empty_grid() {
        let grid = build_grid(&[], None, 10.0, None);
        assert!(grid.is_empty());
        assert_eq!(grid.point_count(), 0);
    }

    #[test]
    fn degenerate_cell_size_means_empty_grid() {
        let pts = points(&[(0.0, 0.0)]);
        assert!(build_grid(&pts, extent_of(&pts), 0.0, None).is_empty());
        assert!(build_grid(&pts, extent_of(&pts), f64::NAN, None).is_empty());
    }

    #[test]
    fn negative_offsets_floor_toward_negative_infinity() {
        let key = CellKey::locate(Vec2::new(-0.5, 9.99), Vec2::ZERO, 10.0);
        assert_eq!(key, CellKey::new(-1, 0));
        assert_eq!(key.to_string(), "-1_0");
    }
}
