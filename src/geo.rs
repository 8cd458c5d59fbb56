//! Geodetic coordinates and great-circle distance.

/// A point on Earth's surface, latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other`, in meters, via the haversine formula.
    pub fn distance_to(self, other: Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        Self::EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let a = Coordinate::new(55.611087, 37.20829);
        assert_eq!(a.distance_to(a), 0.0);
    }

    #[test]
    fn known_pair_is_plausible() {
        // Two Moscow bus stops a few hundred meters apart.
        let a = Coordinate::new(55.611087, 37.20829);
        let b = Coordinate::new(55.595884, 37.209755);
        let d = a.distance_to(b);
        // Straight-line distance should be a bit under the 3900m road distance.
        assert!(d > 1500.0 && d < 2000.0, "distance was {d}");
    }
}
