//! Driving-route adapter and overview-polyline decoding

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::geo::Coordinates;
use crate::{Error, Result};

/// Directions API endpoint
const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// A driving route between two coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Ordered path of coordinates along the route
    pub path: Vec<Coordinates>,

    /// Total distance, as formatted by the service ("4.2 km")
    pub distance_text: String,

    /// Total duration, as formatted by the service ("12 mins")
    pub duration_text: String,

    /// Total distance in meters
    pub distance_meters: u64,

    /// Total duration in seconds
    pub duration_seconds: i64,
}

/// Route lookup over a directions service
#[async_trait]
pub trait DirectionsApi: Send + Sync {
    /// Compute a driving route from `origin` to `destination`.
    ///
    /// Returns `None` when the service reports a non-OK status (no route);
    /// a warning is logged for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be performed
    async fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Option<Route>>;
}

/// Response from the directions API
#[derive(serde::Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(serde::Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
    legs: Vec<RouteLeg>,
}

#[derive(serde::Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(serde::Deserialize)]
struct RouteLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(serde::Deserialize)]
struct TextValue {
    text: String,
    value: i64,
}

/// Directions lookup backed by the Google Directions web service
pub struct GoogleDirectionsClient {
    client: reqwest::Client,
    api_key: SecretString,
}

impl GoogleDirectionsClient {
    /// Create a new directions client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("maps API key required for directions".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl DirectionsApi for GoogleDirectionsClient {
    async fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Option<Route>> {
        tracing::debug!(
            origin_lat = origin.lat,
            origin_lng = origin.lng,
            dest_lat = destination.lat,
            dest_lng = destination.lng,
            "requesting driving route"
        );

        let params = [
            ("origin", format!("{},{}", origin.lat, origin.lng)),
            ("destination", format!("{},{}", destination.lat, destination.lng)),
            ("mode", "driving".to_string()),
            ("key", self.api_key.expose_secret().to_string()),
        ];

        let response = self
            .client
            .get(DIRECTIONS_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "directions request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "directions API error");
            return Err(Error::Directions(format!("directions API error {status}: {body}")));
        }

        let result: DirectionsResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse directions response");
            e
        })?;

        if result.status != "OK" {
            tracing::warn!(status = %result.status, "no route found");
            return Ok(None);
        }

        let Some(route) = result.routes.into_iter().next() else {
            tracing::warn!("directions response carried no routes");
            return Ok(None);
        };

        let path = decode_polyline(&route.overview_polyline.points);
        let (distance, duration) = route.legs.iter().fold((0_i64, 0_i64), |(d, t), leg| {
            (d + leg.distance.value, t + leg.duration.value)
        });
        let (distance_text, duration_text) = route.legs.first().map_or_else(
            || (String::new(), String::new()),
            |leg| (leg.distance.text.clone(), leg.duration.text.clone()),
        );

        tracing::info!(
            points = path.len(),
            distance = %distance_text,
            duration = %duration_text,
            "route ready"
        );

        Ok(Some(Route {
            path,
            distance_text,
            duration_text,
            distance_meters: distance.max(0).unsigned_abs(),
            duration_seconds: duration,
        }))
    }
}

/// Decode an encoded overview polyline into coordinates.
///
/// Implements the standard 1e-5 precision polyline encoding used by the
/// directions service. Malformed trailing data is ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decode_polyline(encoded: &str) -> Vec<Coordinates> {
    let bytes = encoded.as_bytes();
    let mut coords = Vec::new();
    let mut index = 0;
    let mut lat = 0_i64;
    let mut lng = 0_i64;

    while index < bytes.len() {
        let Some(d_lat) = decode_varint(bytes, &mut index) else {
            break;
        };
        let Some(d_lng) = decode_varint(bytes, &mut index) else {
            break;
        };

        lat += d_lat;
        lng += d_lng;
        coords.push(Coordinates::new(lat as f64 * 1e-5, lng as f64 * 1e-5));
    }

    coords
}

/// Decode one zigzag-encoded value, advancing `index`
fn decode_varint(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result = 0_i64;
    let mut shift = 0_u32;

    loop {
        let byte = i64::from(*bytes.get(*index)?) - 63;
        if byte < 0 {
            return None;
        }
        *index += 1;

        result |= (byte & 0x1f) << shift;
        shift += 5;

        if byte < 0x20 {
            break;
        }
    }

    Some(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        assert!(GoogleDirectionsClient::new(SecretString::from(String::new())).is_err());
    }

    #[test]
    fn decodes_reference_polyline() {
        // Reference vector from the polyline encoding documentation
        let coords = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");

        assert_eq!(coords.len(), 3);
        assert!((coords[0].lat - 38.5).abs() < 1e-5);
        assert!((coords[0].lng - -120.2).abs() < 1e-5);
        assert!((coords[1].lat - 40.7).abs() < 1e-5);
        assert!((coords[1].lng - -120.95).abs() < 1e-5);
        assert!((coords[2].lat - 43.252).abs() < 1e-5);
        assert!((coords[2].lng - -126.453).abs() < 1e-5);
    }

    #[test]
    fn decodes_empty_polyline() {
        assert!(decode_polyline("").is_empty());
    }

    #[test]
    fn ignores_truncated_trailing_point() {
        // A dangling latitude without its longitude is dropped
        let full = decode_polyline("_p~iF~ps|U");
        let truncated = decode_polyline("_p~iF~ps|U_ulL");

        assert_eq!(full.len(), 1);
        assert_eq!(truncated.len(), 1);
        assert_eq!(full[0], truncated[0]);
    }

    #[test]
    fn parses_directions_response() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "overview_polyline": {"points": "_p~iF~ps|U"},
                "legs": [{
                    "distance": {"text": "4.2 km", "value": 4200},
                    "duration": {"text": "12 mins", "value": 720}
                }]
            }]
        }"#;

        let parsed: DirectionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.routes[0].legs[0].distance.value, 4200);
        assert_eq!(parsed.routes[0].legs[0].duration.text, "12 mins");
    }

    #[test]
    fn non_ok_status_parses_without_routes() {
        let parsed: DirectionsResponse =
            serde_json::from_str(r#"{"status": "NOT_FOUND"}"#).unwrap();
        assert!(parsed.routes.is_empty());
    }
}
