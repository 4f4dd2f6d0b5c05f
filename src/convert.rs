//! Meters-to-degrees conversion under a flat-earth approximation.

use geo::{Centroid, Polygon};

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Converts linear distances in meters to degrees of latitude/longitude,
/// anchored at a reference latitude.
///
/// One degree of longitude narrows with the cosine of latitude, so the
/// conversion is only accurate near the reference latitude; error grows with
/// distance from it. Good enough for city-scale grids, which is all this
/// tool produces.
#[derive(Debug, Clone, Copy)]
pub struct DegreeConverter {
    ref_lat_rad: f64,
}

impl DegreeConverter {
    /// Anchors the converter at the given latitude in degrees.
    pub fn at_latitude(lat_deg: f64) -> Self {
        Self {
            ref_lat_rad: lat_deg.to_radians(),
        }
    }

    /// Anchors the converter at the boundary polygon's centroid latitude.
    ///
    /// Returns `None` when the polygon has no vertices.
    pub fn for_boundary(boundary: &Polygon<f64>) -> Option<Self> {
        boundary.centroid().map(|c| Self::at_latitude(c.y()))
    }

    /// Degrees of latitude spanned by `meters`.
    pub fn lat_degrees(&self, meters: f64) -> f64 {
        meters / METERS_PER_DEGREE
    }

    /// Degrees of longitude spanned by `meters` at the reference latitude.
    pub fn lon_degrees(&self, meters: f64) -> f64 {
        meters / (METERS_PER_DEGREE * self.ref_lat_rad.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    #[test]
    fn test_lat_degrees_is_latitude_independent() {
        let equator = DegreeConverter::at_latitude(0.0);
        let north = DegreeConverter::at_latitude(60.0);

        assert_eq!(equator.lat_degrees(111_000.0), 1.0);
        assert_eq!(north.lat_degrees(111_000.0), 1.0);
    }

    #[test]
    fn test_lon_degrees_at_equator_matches_lat() {
        let c = DegreeConverter::at_latitude(0.0);
        assert!((c.lon_degrees(555.0) - c.lat_degrees(555.0)).abs() < 1e-12);
    }

    #[test]
    fn test_lon_degrees_widens_away_from_equator() {
        // cos(60°) = 0.5, so a meter spans twice as many longitude degrees
        let c = DegreeConverter::at_latitude(60.0);
        assert!((c.lon_degrees(111_000.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_for_boundary_uses_centroid_latitude() {
        let square = Polygon::new(
            LineString::from(vec![
                (10.0, 40.0),
                (11.0, 40.0),
                (11.0, 42.0),
                (10.0, 42.0),
                (10.0, 40.0),
            ]),
            vec![],
        );

        let from_boundary = DegreeConverter::for_boundary(&square).unwrap();
        let at_center = DegreeConverter::at_latitude(41.0);

        assert!((from_boundary.lon_degrees(200.0) - at_center.lon_degrees(200.0)).abs() < 1e-12);
    }
}
