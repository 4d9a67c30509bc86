//! Geocoding lookups against a GeoDB-style places API
//!
//! Request: a free-text name prefix. Response: a list of places with
//! coordinates and optional country/region/population metadata, mapped
//! straight onto [`SearchResult`].

use super::ServiceError;
use journey_map_lib::{Coordinate, SearchResult};
use serde::Deserialize;

pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    data: Vec<PlaceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceDto {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    population: Option<u64>,
}

impl From<PlaceDto> for SearchResult {
    fn from(place: PlaceDto) -> Self {
        SearchResult {
            name: place.name,
            coordinate: Coordinate::new(place.latitude, place.longitude),
            country: place.country,
            admin_area: place.region,
            population: place.population,
        }
    }
}

impl GeocodingClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Look up places matching the query, most populous first.
    pub async fn lookup(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        let url = format!("{}/places", self.base_url.trim_end_matches('/'));
        tracing::debug!(query, "issuing geocoding lookup");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("namePrefix", query),
                ("limit", "10"),
                ("sort", "-population"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let places: PlacesResponse = response.json().await?;
        Ok(places.data.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_places_response() {
        let json = r#"{
            "data": [
                {
                    "name": "Paris",
                    "latitude": 48.8566,
                    "longitude": 2.3522,
                    "country": "France",
                    "region": "Île-de-France",
                    "population": 2140526
                },
                {
                    "name": "Paris",
                    "latitude": 33.6609,
                    "longitude": -95.5555,
                    "country": "United States of America"
                }
            ]
        }"#;

        let decoded: PlacesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.data.len(), 2);

        let first: SearchResult = decoded.data.into_iter().next().unwrap().into();
        assert_eq!(first.name, "Paris");
        assert_eq!(first.coordinate, Coordinate::new(48.8566, 2.3522));
        assert_eq!(first.admin_area.as_deref(), Some("Île-de-France"));
        assert_eq!(first.population, Some(2_140_526));
    }

    #[test]
    fn test_missing_data_field_is_empty() {
        let decoded: PlacesResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.data.is_empty());
    }
}
