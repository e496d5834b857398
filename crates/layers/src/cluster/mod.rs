//! Grid-based point clustering.
//!
//! Projected marker positions are binned into square cells whose size follows the map
//! resolution, one grid per zoom level. Grids are memoized by [`ZoomGridCache`] and each new
//! cluster carries a single-hop link to its counterpart in the adjacent, coarser zoom level.

pub mod cache;
pub mod grid;
pub mod link;
pub mod points;

pub use cache::*;
pub use grid::*;
pub use link::*;
pub use points::*;

use foundation::math::WGS84_A;
use serde::{Deserialize, Serialize};

/// Map scale per zoom level, supplied by the host map.
pub trait ZoomScale {
    /// Plane units per pixel at `zoom`, `None` outside the supported zoom range.
    fn resolution(&self, zoom: i32) -> Option<f64>;
    fn min_zoom(&self) -> i32;
    fn max_zoom(&self) -> i32;
}

/// Standard web tile pyramid: the mercator world spans one tile at zoom 0.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TileResolutions {
    pub tile_size_px: f64,
    pub min_zoom: i32,
    pub max_zoom: i32,
}

impl Default for TileResolutions {
    fn default() -> Self {
        Self {
            tile_size_px: 256.0,
            min_zoom: 0,
            max_zoom: 22,
        }
    }
}

impl ZoomScale for TileResolutions {
    fn resolution(&self, zoom: i32) -> Option<f64> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return None;
        }
        let world = 2.0 * std::f64::consts::PI * WGS84_A;
        Some(world / (self.tile_size_px * 2f64.powi(zoom)))
    }

    fn min_zoom(&self) -> i32 {
        self.min_zoom
    }

    fn max_zoom(&self) -> i32 {
        self.max_zoom
    }
}

/// Width of a grid cell in plane units: a cluster claims `max_cluster_radius` pixels on each side.
pub fn cell_size(resolution: f64, max_cluster_radius: f64) -> f64 {
    resolution * 2.0 * max_cluster_radius
}

/// When a zoom level may reuse the adjacent level's grid instead of building its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridReuse {
    /// Reuse only when the adjacent grid covers every marker and was binned with the same cell size.
    #[default]
    CellSize,
    /// Reuse whenever the adjacent grid covers every marker. Partitions may differ from a rebuild.
    MarkerCount,
    Never,
}

impl GridReuse {
    pub fn allows(self, adjacent: &Grid, marker_count: usize, cell_size: f64) -> bool {
        match self {
            GridReuse::Never => false,
            GridReuse::MarkerCount => adjacent.point_count() == marker_count,
            GridReuse::CellSize => {
                adjacent.point_count() == marker_count
                    && same_cell_size(adjacent.cell_size(), cell_size)
            }
        }
    }
}

fn same_cell_size(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::{GridReuse, TileResolutions, ZoomScale, cell_size};

    #[test]
    fn tile_resolution_halves_per_zoom() {
        let scale = TileResolutions::default();
        let z0 = scale.resolution(0).unwrap();
        let z1 = scale.resolution(1).unwrap();
        assert!((z0 - 156_543.033_928_041).abs() < 1e-6);
        assert_eq!(z0 / 2.0, z1);
        assert!(scale.resolution(-1).is_none());
        assert!(scale.resolution(23).is_none());
    }

    #[test]
    fn cell_size_spans_twice_the_radius() {
        assert_eq!(cell_size(2.0, 80.0), 320.0);
    }

    #[test]
    fn grid_reuse_reads_camel_case() {
        let reuse: GridReuse = serde_json::from_str("\"markerCount\"").unwrap();
        assert_eq!(reuse, GridReuse::MarkerCount);
        assert_eq!(serde_json::to_string(&GridReuse::CellSize).unwrap(), "\"cellSize\"");
    }
}
