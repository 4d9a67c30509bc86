//! Coordinate value types and spherical distance helpers
//!
//! Coordinates are immutable: no API in this crate mutates one in place,
//! they are only ever replaced. Equality is coordinate-wise, which is what
//! makes stale-state detection by comparison reliable everywhere else.

use geo::Rect;

/// Earth's mean radius in meters, used by the haversine distance.
const EARTH_RADIUS_M: f64 = 6371000.0;

/// A WGS84 position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Format a distance for display: meters below 1 km, kilometers with two
/// decimals at or above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Format a travel time in seconds as "Xh Ym" or "Ym".
pub fn format_duration(seconds: f64) -> String {
    let total_minutes = (seconds / 60.0).round() as u64;
    if total_minutes >= 60 {
        format!("{}h {}m", total_minutes / 60, total_minutes % 60)
    } else {
        format!("{}m", total_minutes.max(1))
    }
}

/// Geographic bounds of the visible map area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLngBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl LatLngBounds {
    pub fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// The bounds as a `geo::Rect` in (lon, lat) space.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::Coord {
                x: self.south_west.longitude,
                y: self.south_west.latitude,
            },
            geo::Coord {
                x: self.north_east.longitude,
                y: self.north_east.latitude,
            },
        )
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        coordinate.latitude >= self.south_west.latitude
            && coordinate.latitude <= self.north_east.latitude
            && coordinate.longitude >= self.south_west.longitude
            && coordinate.longitude <= self.north_east.longitude
    }
}

/// The visible map area as reported by the map surface.
///
/// Owned by the surface; the orchestration core only reads it (traffic
/// regeneration, fit-to-route).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub bounds: LatLngBounds,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, bounds: LatLngBounds) -> Self {
        Self {
            center,
            zoom,
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = Coordinate::new(48.8566, 2.3522);
        assert!(haversine_distance(&p, &p).abs() < f64::EPSILON);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris -> London is roughly 344 km
        let paris = Coordinate::new(48.8566, 2.3522);
        let london = Coordinate::new(51.5074, -0.1278);

        let distance = haversine_distance(&paris, &london);
        assert!(distance > 330_000.0);
        assert!(distance < 360_000.0);
    }

    #[test]
    fn test_format_distance_meters_below_1km() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(999.4), "999 m");
    }

    #[test]
    fn test_format_distance_kilometers_at_1km() {
        assert_eq!(format_distance(1000.0), "1.00 km");
        assert_eq!(format_distance(5230.0), "5.23 km");
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(48.85, 2.35).is_valid());
        assert!(!Coordinate::new(f64::NAN, 2.35).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = LatLngBounds::new(Coordinate::new(48.0, 2.0), Coordinate::new(49.0, 3.0));
        assert!(bounds.contains(&Coordinate::new(48.5, 2.5)));
        assert!(!bounds.contains(&Coordinate::new(47.9, 2.5)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(90.0), "2m");
        assert_eq!(format_duration(3900.0), "1h 5m");
    }
}
