//! Places text-search adapter

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::geo::Coordinates;
use crate::{Error, Result};

/// Maximum candidates taken from one search
pub const MAX_CANDIDATES: usize = 10;

/// Places API endpoint for text search
const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

/// A raw place candidate as reported by the search service
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    /// Place name
    pub name: String,

    /// Formatted address or vicinity
    pub address: String,

    /// Place coordinates
    pub location: Coordinates,
}

/// Text search over a places service
#[async_trait]
pub trait PlacesSearch: Send + Sync {
    /// Search places matching `query`, optionally biased around `location`
    /// within `radius_m` meters.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be performed. A non-OK service
    /// status is not an error: it yields an empty candidate list with a
    /// diagnostic warning.
    async fn text_search(
        &self,
        query: &str,
        location: Option<Coordinates>,
        radius_m: u32,
    ) -> Result<Vec<PlaceCandidate>>;
}

/// Response from the places text-search API
#[derive(serde::Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(serde::Deserialize)]
struct PlaceResult {
    name: String,
    formatted_address: Option<String>,
    vicinity: Option<String>,
    geometry: PlaceGeometry,
}

#[derive(serde::Deserialize)]
struct PlaceGeometry {
    location: PlaceLatLng,
}

#[derive(serde::Deserialize)]
struct PlaceLatLng {
    lat: f64,
    lng: f64,
}

/// Places search backed by the Google Places web service
pub struct GooglePlacesClient {
    client: reqwest::Client,
    api_key: SecretString,
}

impl GooglePlacesClient {
    /// Create a new places client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("maps API key required for places search".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl PlacesSearch for GooglePlacesClient {
    async fn text_search(
        &self,
        query: &str,
        location: Option<Coordinates>,
        radius_m: u32,
    ) -> Result<Vec<PlaceCandidate>> {
        tracing::debug!(query, radius_m, "starting places text search");

        let mut params = vec![
            ("query".to_string(), query.to_string()),
            ("key".to_string(), self.api_key.expose_secret().to_string()),
        ];
        if let Some(loc) = location {
            params.push(("location".to_string(), format!("{},{}", loc.lat, loc.lng)));
            params.push(("radius".to_string(), radius_m.to_string()));
        }

        let response = self
            .client
            .get(TEXT_SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "places request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "places API error");
            return Err(Error::Places(format!("places API error {status}: {body}")));
        }

        let result: TextSearchResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse places response");
            e
        })?;

        match result.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            other => {
                // Non-OK service status degrades to an empty result list
                tracing::warn!(status = other, query, "places search returned non-OK status");
                return Ok(Vec::new());
            }
        }

        let candidates: Vec<PlaceCandidate> = result
            .results
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|place| PlaceCandidate {
                name: place.name,
                address: place
                    .formatted_address
                    .or(place.vicinity)
                    .unwrap_or_default(),
                location: Coordinates::new(place.geometry.location.lat, place.geometry.location.lng),
            })
            .collect();

        tracing::info!(query, count = candidates.len(), "places search complete");
        Ok(candidates)
    }
}
