//! Destination search, ranking, and routing
//!
//! Places and directions lookups are delegated to external services behind
//! narrow trait adapters; this module owns candidate ranking and the display
//! formatting of distances, drive times, and battery estimates.

pub mod directions;
pub mod format;
pub mod places;
pub mod search;

use serde::{Deserialize, Serialize};

pub use directions::{DirectionsApi, GoogleDirectionsClient, Route, decode_polyline};
pub use places::{GooglePlacesClient, MAX_CANDIDATES, PlaceCandidate, PlacesSearch};
pub use search::SearchService;

/// A search result or active navigation target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Display name
    pub name: String,

    /// Street address or vicinity
    pub address: String,

    /// Formatted distance for display ("850 m", "1.5 km")
    pub distance: String,

    /// Formatted drive time for display ("12 min")
    pub duration: String,

    /// Estimated battery usage for the trip, percent of capacity
    pub battery_usage: f64,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Raw distance in meters, the sort key for result lists.
    /// Absent when no position fix was available at search time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_value: Option<f64>,
}

impl Destination {
    /// Coordinates of this destination
    #[must_use]
    pub const fn coordinates(&self) -> crate::geo::Coordinates {
        crate::geo::Coordinates::new(self.lat, self.lng)
    }
}
