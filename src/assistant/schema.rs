//! Structured-destination response schema and validation
//!
//! The model is constrained to return a JSON array of destination objects.
//! Validation happens by deserialization into [`DestinationSuggestion`], where
//! every field is required; anything that does not parse yields an empty list
//! rather than an error, since a failed suggestion list must not break the
//! search flow.

use serde::Deserialize;

use crate::nav::Destination;

/// Response schema constraining structured destination generation
#[must_use]
pub fn destination_list_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": {"type": "STRING"},
                "address": {"type": "STRING"},
                "distance": {"type": "STRING"},
                "duration": {"type": "STRING"},
                "batteryUsage": {"type": "NUMBER"},
                "lat": {"type": "NUMBER"},
                "lng": {"type": "NUMBER"}
            },
            "required": ["name", "address", "distance", "duration", "batteryUsage", "lat", "lng"]
        }
    })
}

/// One destination object as produced by the model; all fields required
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationSuggestion {
    name: String,
    address: String,
    distance: String,
    duration: String,
    battery_usage: f64,
    lat: f64,
    lng: f64,
}

impl From<DestinationSuggestion> for Destination {
    fn from(s: DestinationSuggestion) -> Self {
        Self {
            name: s.name,
            address: s.address,
            distance: s.distance,
            duration: s.duration,
            battery_usage: s.battery_usage,
            lat: s.lat,
            lng: s.lng,
            distance_value: None,
        }
    }
}

/// Parse a structured-generation payload into destinations.
///
/// Unparsable JSON or a shape mismatch yields an empty list.
#[must_use]
pub fn parse_destinations(payload: &str) -> Vec<Destination> {
    match serde_json::from_str::<Vec<DestinationSuggestion>>(payload) {
        Ok(suggestions) => suggestions.into_iter().map(Destination::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "structured destination payload did not validate");
            Vec::new()
        }
    }
}
