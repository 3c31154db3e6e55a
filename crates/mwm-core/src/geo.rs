//! Coordinate types and the fixed-point to WGS84 projection.
//!
//! Geometry is stored as unsigned fixed-point integers on a square grid of
//! `coord_size` cells per axis covering `[-180, 180]` in both directions of
//! the format's own mercator plane. Raw [`Point`]s stay in grid units until
//! they are explicitly projected with [`CoordSpace::to_4326`].

use std::f64::consts::PI;
use std::fmt;

/// Coordinate bits assumed when a container carries no header
pub const DEFAULT_COORD_BITS: u32 = 30;

/// Raw fixed-point grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// Horizontal grid coordinate
    pub x: i64,
    /// Vertical grid coordinate
    pub y: i64,
}

impl Point {
    /// Creates a point from grid coordinates
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x as i64, y as i64)
    }
}

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Projected bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Minimum longitude and latitude
    pub left_bottom: LatLon,
    /// Maximum longitude and latitude
    pub right_top: LatLon,
}

/// Coordinate scale and base point of one open container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordSpace {
    coord_bits: u32,
    coord_size: u64,
    base_point: Point,
}

impl Default for CoordSpace {
    fn default() -> Self {
        Self::new(DEFAULT_COORD_BITS, Point::default())
    }
}

impl CoordSpace {
    /// Creates a coordinate space of `2^coord_bits - 1` cells per axis.
    ///
    /// `coord_bits` must be in `1..=63`; the header decoder checks this.
    pub fn new(coord_bits: u32, base_point: Point) -> Self {
        Self {
            coord_bits,
            coord_size: (1u64 << coord_bits) - 1,
            base_point,
        }
    }

    /// Number of bits per axis
    pub fn coord_bits(&self) -> u32 {
        self.coord_bits
    }

    /// Largest grid coordinate per axis
    pub fn coord_size(&self) -> u64 {
        self.coord_size
    }

    /// Point every stored delta is relative to
    pub fn base_point(&self) -> Point {
        self.base_point
    }

    /// Projects a grid point to WGS84 degrees.
    ///
    /// The latitude step is `(360 / pi) * atan(tanh(y * pi / 360))` applied
    /// to the linear plane coordinate, evaluated in this exact order.
    pub fn to_4326(&self, point: Point) -> LatLon {
        let size = self.coord_size as f64;
        let lon = point.x as f64 * 360.0 / size - 180.0;
        let y = point.y as f64 * 360.0 / size - 180.0;
        let lat = 360.0 * (y * PI / 360.0).tanh().atan() / PI;
        LatLon { lon, lat }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_LAT: f64 = 85.051_128_779_806_59;

    fn assert_close(actual: LatLon, lon: f64, lat: f64) {
        assert!(
            (actual.lon - lon).abs() < 1e-6 && (actual.lat - lat).abs() < 1e-6,
            "{actual} != ({lon}, {lat})"
        );
    }

    #[test]
    fn test_projection_corners() {
        let space = CoordSpace::new(30, Point::default());
        let size = space.coord_size() as i64;
        assert_close(space.to_4326(Point::new(0, 0)), -180.0, -MAX_LAT);
        assert_close(space.to_4326(Point::new(size, size)), 180.0, MAX_LAT);
    }

    #[test]
    fn test_projection_fixtures() {
        let space = CoordSpace::new(30, Point::default());
        let size = space.coord_size() as f64;
        // Quarter of the plane: x = -90, linear y = 90
        let quarter = Point::new((size * 0.25).round() as i64, (size * 0.75).round() as i64);
        let expected_lat = 360.0 * (PI / 4.0).tanh().atan() / PI;
        assert_close(space.to_4326(quarter), -90.0, expected_lat);
        assert!((expected_lat - 66.513_260_443_111_86).abs() < 1e-9);
    }

    #[test]
    fn test_projection_city_centres() {
        // Grid points from the forward mercator ln(tan(pi/4 + lat/2)),
        // rounded to the 30-bit grid
        let space = CoordSpace::new(30, Point::default());
        assert_close(space.to_4326(Point::new(649_068_879, 738_087_370)), 37.6173, 55.7558);
        assert_close(space.to_4326(Point::new(987_870_215, 429_397_675)), 151.2093, -33.8688);
        assert_close(space.to_4326(Point::new(471_424_558, 788_381_992)), -21.9426, 64.1466);
    }

    #[test]
    fn test_default_space() {
        let space = CoordSpace::default();
        assert_eq!(space.coord_bits(), 30);
        assert_eq!(space.coord_size(), (1 << 30) - 1);
        assert_eq!(space.base_point(), Point::new(0, 0));
    }
}
