//! Dashboard event publishing
//!
//! The gateway core is headless; an embedding UI subscribes to a broadcast
//! channel of [`DashboardEvent`]s to drive its map, result list, and voice
//! feedback widgets. Publishing is best-effort: a bus without subscribers
//! drops events silently.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::nav::{Destination, Route};

/// Buffered events per subscriber before lagging
const EVENT_BUFFER: usize = 64;

/// Events emitted by the gateway core
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DashboardEvent {
    /// Wake word heard; command capture in progress
    VoiceListening,

    /// Spoken command dispatched to the assistant
    VoiceProcessing {
        /// The captured command text
        command: String,
    },

    /// Terminal feedback for the current voice session
    VoiceFeedback {
        /// Feedback text to display
        text: String,
    },

    /// Voice session fully reset
    VoiceIdle,

    /// Ranked search results ready for display
    SearchResults {
        /// The query that produced them
        query: String,
        /// Destinations, ascending by distance
        results: Vec<Destination>,
    },

    /// Route to the selected destination ready for rendering
    RouteReady {
        /// The navigation target
        destination: Destination,
        /// The driving route
        route: Route,
        /// Estimated arrival clock time ("14:54")
        arrival: String,
    },

    /// Active navigation cancelled
    RouteCleared,
}

/// Broadcast sender for dashboard events
pub type EventBus = broadcast::Sender<DashboardEvent>;

/// Create an event bus and an initial subscription
#[must_use]
pub fn event_bus() -> (EventBus, broadcast::Receiver<DashboardEvent>) {
    broadcast::channel(EVENT_BUFFER)
}
