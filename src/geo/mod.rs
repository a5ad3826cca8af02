//! Geolocation tracking
//!
//! Current position is process-wide shared state with a single writer (the
//! provider watch task) and any number of readers (search, routing, the
//! assistant's GPS tool). A `tokio::sync::watch` channel carries the latest
//! fix with last-write-wins semantics.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position with an optional heading in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Heading in degrees clockwise from north, when the platform reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl Coordinates {
    /// Create coordinates without a heading
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            heading: None,
        }
    }
}

/// Straight-line (great-circle) distance between two positions, in meters
#[must_use]
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Continuous position source
///
/// Implementations wrap the platform geolocation API behind a narrow
/// interface. A host without the capability simply provides no implementation
/// and the rest of the gateway runs without position data.
#[async_trait]
pub trait GeolocationProvider: Send {
    /// Start a continuous position watch
    ///
    /// # Errors
    ///
    /// Returns error if the watch cannot be started
    async fn watch(&mut self) -> Result<BoxStream<'static, Coordinates>>;
}

/// Owns the current-position channel and the task feeding it
pub struct LocationTracker {
    rx: watch::Receiver<Option<Coordinates>>,
    task: Option<JoinHandle<()>>,
}

impl LocationTracker {
    /// Start tracking fixes from `provider`
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot start its watch
    pub async fn start<P: GeolocationProvider + 'static>(mut provider: P) -> Result<Self> {
        let mut stream = provider.watch().await?;
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            while let Some(fix) = stream.next().await {
                tracing::trace!(lat = fix.lat, lng = fix.lng, "position fix");
                if tx.send(Some(fix)).is_err() {
                    break;
                }
            }
            tracing::debug!("position stream ended");
        });

        Ok(Self {
            rx,
            task: Some(task),
        })
    }

    /// A tracker that never receives a fix (no geolocation capability)
    #[must_use]
    pub fn disabled() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx, task: None }
    }

    /// Latest known position, if any fix has arrived
    #[must_use]
    pub fn current(&self) -> Option<Coordinates> {
        *self.rx.borrow()
    }

    /// Subscribe to position updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinates>> {
        self.rx.clone()
    }

    /// Stop consuming fixes
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
