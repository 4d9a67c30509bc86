//! Route calculation against an OSRM-style routing engine
//!
//! Request: the ordered waypoint list as `lon,lat` pairs. Response: zero or
//! more candidate routes with a GeoJSON path and a distance/duration
//! summary. Only the first (primary) candidate is ever used; "no route" is
//! a normal outcome, not an error.

use super::ServiceError;
use journey_map_lib::{Coordinate, RouteResult, WaypointList};
use serde::Deserialize;

pub struct RoutingClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl RoutingClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Compute a route through the given waypoints. `Ok(None)` means the
    /// engine could not find one.
    pub async fn compute(
        &self,
        waypoints: &WaypointList,
    ) -> Result<Option<RouteResult>, ServiceError> {
        let url = format!(
            "{}/route/v1/driving/{}",
            self.base_url.trim_end_matches('/'),
            coordinate_path(waypoints)
        );
        tracing::debug!(waypoints = waypoints.len(), "requesting route");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("alternatives", "false"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let decoded: OsrmResponse = response.json().await?;
        if decoded.code != "Ok" {
            tracing::debug!(code = decoded.code, "engine reported no route");
            return Ok(None);
        }

        // Tie-break: the first candidate is the primary route
        let Some(primary) = decoded.routes.into_iter().next() else {
            return Ok(None);
        };
        if primary.geometry.coordinates.is_empty() {
            return Err(ServiceError::Decode("route without geometry".to_string()));
        }

        Ok(Some(RouteResult {
            path: primary
                .geometry
                .coordinates
                .iter()
                .map(|&[lon, lat]| Coordinate::new(lat, lon))
                .collect(),
            total_distance_meters: primary.distance,
            total_time_seconds: primary.duration,
        }))
    }
}

/// The `lon,lat;lon,lat;...` path segment of the route request.
fn coordinate_path(waypoints: &WaypointList) -> String {
    waypoints
        .iter()
        .map(|w| format!("{},{}", w.coordinate.longitude, w.coordinate.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey_map_lib::Waypoint;

    #[test]
    fn test_coordinate_path_is_lon_lat_ordered() {
        let waypoints: WaypointList = [
            Waypoint::new(Coordinate::new(48.8566, 2.3522)),
            Waypoint::new(Coordinate::new(51.5074, -0.1278)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            coordinate_path(&waypoints),
            "2.3522,48.8566;-0.1278,51.5074"
        );
    }

    #[test]
    fn test_decodes_route_response() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {
                    "distance": 5000.0,
                    "duration": 600.0,
                    "geometry": {
                        "coordinates": [[2.3522, 48.8566], [2.36, 48.87]]
                    }
                },
                {
                    "distance": 6200.0,
                    "duration": 710.0,
                    "geometry": {
                        "coordinates": [[2.3522, 48.8566], [2.37, 48.88]]
                    }
                }
            ]
        }"#;

        let decoded: OsrmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.code, "Ok");

        // First candidate wins; the path comes back lat/lon ordered
        let primary = decoded.routes.into_iter().next().unwrap();
        assert_eq!(primary.distance, 5000.0);
        let first = primary.geometry.coordinates[0];
        assert_eq!(Coordinate::new(first[1], first[0]), Coordinate::new(48.8566, 2.3522));
    }

    #[test]
    fn test_no_route_code_decodes() {
        let decoded: OsrmResponse =
            serde_json::from_str(r#"{"code": "NoRoute"}"#).unwrap();
        assert_eq!(decoded.code, "NoRoute");
        assert!(decoded.routes.is_empty());
    }
}
