use super::Vec2;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude limit of the square web mercator plane.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_6;

/// Maps a geographic coordinate (x = longitude, y = latitude, degrees) onto a projected plane.
pub trait Projection {
    fn project(&self, coordinate: Vec2) -> Vec2;
}

/// Identity projection: coordinates already live in the plane.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PlaneProjection;

impl Projection for PlaneProjection {
    fn project(&self, coordinate: Vec2) -> Vec2 {
        coordinate
    }
}

/// Spherical mercator (EPSG:3857), meters on the WGS84 major radius.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SphericalMercator;

impl Projection for SphericalMercator {
    fn project(&self, coordinate: Vec2) -> Vec2 {
        let lat = coordinate
            .y
            .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
            .to_radians();
        let x = WGS84_A * coordinate.x.to_radians();
        let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + lat * 0.5).tan().ln();
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaneProjection, Projection, SphericalMercator, WGS84_A};
    use crate::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn plane_projection_is_identity() {
        let p = Vec2::new(12.5, -3.0);
        assert_eq!(PlaneProjection.project(p), p);
    }

    #[test]
    fn mercator_origin_and_antimeridian() {
        let origin = SphericalMercator.project(Vec2::new(0.0, 0.0));
        assert_close(origin.x, 0.0, 1e-9);
        assert_close(origin.y, 0.0, 1e-9);

        let east = SphericalMercator.project(Vec2::new(180.0, 0.0));
        assert_close(east.x, WGS84_A * std::f64::consts::PI, 1e-6);
    }

    #[test]
    fn mercator_plane_is_square_at_latitude_limit() {
        let corner = SphericalMercator.project(Vec2::new(180.0, 90.0));
        assert_close(corner.x, corner.y, 1e-3);
    }
}
