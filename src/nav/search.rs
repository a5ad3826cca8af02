//! Destination search orchestration and ranking

use crate::config::VehicleConfig;
use crate::db::HistoryRepo;
use crate::geo::{Coordinates, haversine_distance};
use crate::nav::places::{MAX_CANDIDATES, PlaceCandidate, PlacesSearch};
use crate::nav::{Destination, format};

/// Destination search over a places collaborator, with history recording
pub struct SearchService<P> {
    places: P,
    history: HistoryRepo,
    vehicle: VehicleConfig,
    radius_m: u32,
}

impl<P: PlacesSearch> SearchService<P> {
    /// Create a new search service
    pub const fn new(places: P, history: HistoryRepo, vehicle: VehicleConfig, radius_m: u32) -> Self {
        Self {
            places,
            history,
            vehicle,
            radius_m,
        }
    }

    /// Search destinations for `query`, ranked by distance from `origin`.
    ///
    /// The query is recorded in the recent-search history. Provider failures
    /// degrade to an empty list; they are never fatal to the search flow.
    pub async fn search(&self, query: &str, origin: Option<Coordinates>) -> Vec<Destination> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Err(e) = self.history.record(query) {
            tracing::warn!(error = %e, "failed to record search history");
        }

        let candidates = match self.places.text_search(query, origin, self.radius_m).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, query, "places search failed");
                return Vec::new();
            }
        };

        rank_candidates(candidates, origin, &self.vehicle)
    }

    /// Recent search queries, most recent first
    #[must_use]
    pub fn recent_searches(&self) -> Vec<String> {
        self.history.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load search history");
            Vec::new()
        })
    }
}

/// Rank place candidates by straight-line distance from `origin`.
///
/// At most [`MAX_CANDIDATES`] survive. The sort is stable and ascending on
/// the raw meter value; candidates keep the service's relative order when
/// distances tie or no origin is known.
#[must_use]
pub fn rank_candidates(
    candidates: Vec<PlaceCandidate>,
    origin: Option<Coordinates>,
    vehicle: &VehicleConfig,
) -> Vec<Destination> {
    let mut destinations: Vec<Destination> = candidates
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|candidate| destination_from_candidate(candidate, origin, vehicle))
        .collect();

    destinations.sort_by(|a, b| {
        a.distance_value
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance_value.unwrap_or(f64::INFINITY))
    });

    destinations
}

/// Build a display destination from a raw candidate
fn destination_from_candidate(
    candidate: PlaceCandidate,
    origin: Option<Coordinates>,
    vehicle: &VehicleConfig,
) -> Destination {
    let distance_value = origin.map(|from| haversine_distance(from, candidate.location));

    let (distance, duration, battery_usage) = distance_value.map_or_else(
        || ("-".to_string(), "-".to_string(), 0.0),
        |meters| {
            (
                format::format_distance(meters),
                format::format_duration(format::estimate_duration_minutes(meters)),
                format::estimate_battery_usage(
                    meters,
                    vehicle.consumption_kwh_per_100km,
                    vehicle.battery_kwh,
                ),
            )
        },
    );

    Destination {
        name: candidate.name,
        address: candidate.address,
        distance,
        duration,
        battery_usage,
        lat: candidate.location.lat,
        lng: candidate.location.lng,
        distance_value,
    }
}
