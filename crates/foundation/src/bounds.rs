use crate::math::Vec2;

/// Axis-aligned bounding box in a 2D plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Degenerate box covering a single point.
    pub fn from_point(p: Vec2) -> Self {
        Aabb2::new([p.x, p.y], [p.x, p.y])
    }

    /// Box spanning `center ± half` on both axes.
    pub fn around(center: Vec2, half: f64) -> Self {
        Aabb2::new(
            [center.x - half, center.y - half],
            [center.x + half, center.y + half],
        )
    }

    pub fn combine(self, other: Aabb2) -> Self {
        Aabb2::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }

    pub fn min_corner(&self) -> Vec2 {
        Vec2::new(self.min[0], self.min[1])
    }

    pub fn max_corner(&self) -> Vec2 {
        Vec2::new(self.max[0], self.max[1])
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Closed-interval overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}
