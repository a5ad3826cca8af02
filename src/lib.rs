//! Cockpit Gateway - voice and navigation core for in-car dashboards
//!
//! This library provides the headless core behind an in-car navigation and
//! infotainment UI:
//! - Voice command capture (wake word detection, capture/cool-down state machine)
//! - AI request pipeline (destination extraction, structured suggestions, retry)
//! - Destination search, ranking, and routing
//! - Geolocation tracking and recent-search history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Dashboard UI (embedder)              │
//! │     Map  │  Results  │  Voice feedback  │  ...      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ GatewayHandle / DashboardEvent
//! ┌────────────────────▼────────────────────────────────┐
//! │                Cockpit Gateway                       │
//! │  Daemon │ Voice machine │ Assistant │ Search/Route  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Speech API │ Geolocation │ LLM │ Places/Directions │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assistant;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod events;
pub mod geo;
pub mod nav;
pub mod voice;

pub use config::Config;
pub use daemon::{Daemon, GatewayHandle, GatewayRequest};
pub use db::{DbConn, DbPool, HistoryRepo};
pub use error::{Error, Result};
pub use events::{DashboardEvent, EventBus, event_bus};
pub use geo::{Coordinates, GeolocationProvider, LocationTracker, haversine_distance};
pub use nav::{Destination, Route, SearchService};
pub use voice::{
    DestinationExtractor, SpeechRecognizer, VoiceController, VoiceMachine, VoicePhase,
    WakeWordDetector,
};
