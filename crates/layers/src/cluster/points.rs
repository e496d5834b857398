use foundation::Aabb2;
use foundation::math::{Projection, Vec2};
use tracing::warn;

use crate::markers::{MarkerCollection, MarkerId, Revision};

/// A marker position in the projected plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterPoint {
    pub position: Vec2,
    pub marker: MarkerId,
}

/// Projected positions and combined extent of a marker collection at one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSnapshot {
    points: Vec<ClusterPoint>,
    extent: Option<Aabb2>,
    revision: Revision,
}

impl PointSnapshot {
    /// Projects every marker once. Markers that project to non-finite coordinates are skipped.
    pub fn capture<P: Projection + ?Sized>(markers: &MarkerCollection, projection: &P) -> Self {
        let mut points = Vec::with_capacity(markers.len());
        let mut extent: Option<Aabb2> = None;

        for (id, marker) in markers.iter() {
            let position = projection.project(marker.coordinates);
            if !position.is_finite() {
                warn!(marker = id.0, "marker projects outside the plane, not clustered");
                continue;
            }
            let point_extent = Aabb2::from_point(position);
            extent = Some(match extent {
                Some(e) => e.combine(point_extent),
                None => point_extent,
            });
            points.push(ClusterPoint {
                position,
                marker: id,
            });
        }

        Self {
            points,
            extent,
            revision: markers.revision(),
        }
    }

    pub fn points(&self) -> &[ClusterPoint] {
        &self.points
    }

    /// `None` when there is nothing to cluster.
    pub fn extent(&self) -> Option<Aabb2> {
        self.extent
    }

    /// Revision of the marker collection this snapshot was taken from.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// True while `markers` is the same collection, unchanged since the capture.
    pub fn is_current_for(&self, markers: &MarkerCollection) -> bool {
        self.revision == markers.revision()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
