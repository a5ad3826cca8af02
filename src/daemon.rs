//! Daemon - the main gateway service
//!
//! Wires geolocation, the voice controller, destination search, and routing
//! together, and publishes dashboard events for an embedding UI.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::assistant::{AssistantPipeline, GeminiClient};
use crate::config::Config;
use crate::db::{self, DbPool, HistoryRepo};
use crate::events::{DashboardEvent, EventBus, event_bus};
use crate::geo::{Coordinates, LocationTracker};
use crate::nav::{
    Destination, DirectionsApi, GoogleDirectionsClient, GooglePlacesClient, SearchService, format,
};
use crate::voice::{ConsoleRecognizer, VoiceController, VoiceMachine, WakeWordDetector};
use crate::{Error, Result};

/// Fallback position when no fix is available (Lisbon)
const FALLBACK_CENTER: Coordinates = Coordinates::new(38.7223, -9.1393);

/// Buffered gateway requests
const REQUEST_BUFFER: usize = 16;

/// Requests accepted by the gateway core
#[derive(Debug, Clone)]
pub enum GatewayRequest {
    /// Search destinations for a query
    Search {
        /// Free-text query
        query: String,
    },

    /// Promote a destination to the active navigation target
    Select {
        /// The chosen destination
        destination: Destination,
    },

    /// Cancel active navigation
    Cancel,
}

/// Handle through which an embedding UI drives the gateway
#[derive(Clone)]
pub struct GatewayHandle {
    tx: mpsc::Sender<GatewayRequest>,
    bus: EventBus,
}

impl GatewayHandle {
    /// Request a destination search
    ///
    /// # Errors
    ///
    /// Returns error if the daemon has stopped
    pub async fn search(&self, query: impl Into<String>) -> Result<()> {
        self.send(GatewayRequest::Search {
            query: query.into(),
        })
        .await
    }

    /// Select a destination for navigation
    ///
    /// # Errors
    ///
    /// Returns error if the daemon has stopped
    pub async fn select(&self, destination: Destination) -> Result<()> {
        self.send(GatewayRequest::Select { destination }).await
    }

    /// Cancel active navigation
    ///
    /// # Errors
    ///
    /// Returns error if the daemon has stopped
    pub async fn cancel(&self) -> Result<()> {
        self.send(GatewayRequest::Cancel).await
    }

    /// Subscribe to dashboard events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.bus.subscribe()
    }

    async fn send(&self, request: GatewayRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| Error::Voice("gateway stopped".to_string()))
    }
}

/// The cockpit daemon - orchestrates voice, search, and routing
pub struct Daemon {
    config: Config,
    db: DbPool,
    bus: EventBus,
    requests_tx: mpsc::Sender<GatewayRequest>,
    requests_rx: mpsc::Receiver<GatewayRequest>,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if initialization fails
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.data_dir.join("cockpit.db");
        let db = db::init(&db_path)?;
        tracing::info!(path = %db_path.display(), "database initialized");

        let (bus, _) = event_bus();
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_BUFFER);

        Ok(Self {
            config,
            db,
            bus,
            requests_tx,
            requests_rx,
        })
    }

    /// The wake word this daemon listens for
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.config.voice.wake_word
    }

    /// Handle for driving the gateway from an embedding UI
    #[must_use]
    pub fn handle(&self) -> GatewayHandle {
        GatewayHandle {
            tx: self.requests_tx.clone(),
            bus: self.bus.clone(),
        }
    }

    /// Run until interrupted, without a geolocation capability
    ///
    /// # Errors
    ///
    /// Returns error if the daemon encounters a fatal error
    pub async fn run(self) -> Result<()> {
        self.run_with_tracker(LocationTracker::disabled()).await
    }

    /// Run until interrupted, reading position fixes from `tracker`
    ///
    /// # Errors
    ///
    /// Returns error if the daemon encounters a fatal error
    #[allow(clippy::too_many_lines)]
    pub async fn run_with_tracker(mut self, tracker: LocationTracker) -> Result<()> {
        tracing::info!(
            vehicle = %self.config.vehicle.name,
            voice = self.config.voice.enabled,
            "daemon running"
        );

        let tracker = Arc::new(tracker);
        let history = HistoryRepo::new(self.db.clone());

        // Assistant pipeline, if a Gemini key is configured
        let pipeline = match &self.config.api_keys.gemini {
            Some(key) => {
                let client = GeminiClient::new(key.clone(), self.config.assistant.model.clone())?;
                tracing::info!(model = %self.config.assistant.model, "assistant pipeline ready");
                Some(Arc::new(AssistantPipeline::new(
                    client,
                    Arc::clone(&tracker) as Arc<dyn crate::assistant::GpsResolver>,
                    self.config.assistant.max_attempts,
                    self.config.vehicle.name.clone(),
                )))
            }
            None => {
                tracing::info!("no Gemini API key - assistant unavailable");
                None
            }
        };

        // Places search and directions, if a maps key is configured
        let search_service = match &self.config.api_keys.maps {
            Some(key) => {
                let places = GooglePlacesClient::new(key.clone())?;
                Some(SearchService::new(
                    places,
                    history.clone(),
                    self.config.vehicle.clone(),
                    self.config.search.radius_m,
                ))
            }
            None => {
                tracing::info!("no maps API key - places search unavailable");
                None
            }
        };
        let directions = match &self.config.api_keys.maps {
            Some(key) => Some(GoogleDirectionsClient::new(key.clone())?),
            None => None,
        };

        // Shutdown signal shared by all tasks
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        {
            let shutdown_tx = shutdown_tx.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(true);
                }
            });
        }

        // Voice controller, if the subsystem is enabled and an assistant exists.
        // Anything missing degrades silently: the gateway runs without voice.
        let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<String>(REQUEST_BUFFER);
        let voice_task = if self.config.voice.enabled
            && let Some(pipeline) = &pipeline
        {
            let detector = WakeWordDetector::new(&self.config.voice.wake_word)?;
            let (recognizer, recognizer_events) = ConsoleRecognizer::with_receiver();
            let controller = VoiceController::new(
                recognizer,
                recognizer_events,
                VoiceMachine::new(detector),
                Arc::clone(pipeline),
                dispatch_tx,
                self.bus.clone(),
            )
            .with_timings(
                std::time::Duration::from_millis(self.config.voice.capture_window_ms),
                std::time::Duration::from_millis(self.config.voice.cooldown_ms),
            );

            tracing::info!(wake_word = %self.config.voice.wake_word, "listening for wake word");
            let controller_shutdown = shutdown_rx.clone();
            Some(tokio::spawn(controller.run(controller_shutdown)))
        } else {
            if self.config.voice.enabled {
                tracing::info!("voice disabled - assistant unavailable");
            } else {
                tracing::info!("voice disabled by configuration");
            }
            None
        };

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("shutdown requested");
                        break;
                    }
                }
                Some(request) = self.requests_rx.recv() => {
                    self.handle_request(
                        request,
                        &tracker,
                        search_service.as_ref(),
                        pipeline.as_deref(),
                        directions.as_ref(),
                        &history,
                    )
                    .await;
                }
                Some(destination) = dispatch_rx.recv() => {
                    // A spoken destination behaves like a typed search
                    self.handle_request(
                        GatewayRequest::Search { query: destination },
                        &tracker,
                        search_service.as_ref(),
                        pipeline.as_deref(),
                        directions.as_ref(),
                        &history,
                    )
                    .await;
                }
            }
        }

        let _ = shutdown_tx.send(true);
        if let Some(task) = voice_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "voice controller failed"),
                Err(e) => tracing::warn!(error = %e, "voice controller task panicked"),
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Handle one gateway request
    async fn handle_request(
        &self,
        request: GatewayRequest,
        tracker: &LocationTracker,
        search_service: Option<&SearchService<GooglePlacesClient>>,
        pipeline: Option<&AssistantPipeline<GeminiClient>>,
        directions: Option<&GoogleDirectionsClient>,
        history: &HistoryRepo,
    ) {
        match request {
            GatewayRequest::Search { query } => {
                let origin = tracker.current();

                let mut results = match search_service {
                    Some(service) => service.search(&query, origin).await,
                    None => {
                        if let Err(e) = history.record(&query) {
                            tracing::warn!(error = %e, "failed to record search history");
                        }
                        Vec::new()
                    }
                };

                // AI structured suggestions when the places path yields nothing
                if results.is_empty()
                    && let Some(pipeline) = pipeline
                {
                    results = pipeline
                        .generate_destinations(&query, origin)
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "structured suggestions failed");
                            Vec::new()
                        });
                }

                tracing::info!(query = %query, count = results.len(), "search complete");
                let _ = self.bus.send(DashboardEvent::SearchResults { query, results });
            }
            GatewayRequest::Select { destination } => {
                let Some(directions) = directions else {
                    tracing::warn!("no directions client - cannot route");
                    return;
                };

                let origin = tracker.current().unwrap_or(FALLBACK_CENTER);
                match directions.route(origin, destination.coordinates()).await {
                    Ok(Some(route)) => {
                        let arrival = format::arrival_display(route.duration_seconds);
                        let _ = self.bus.send(DashboardEvent::RouteReady {
                            destination,
                            route,
                            arrival,
                        });
                    }
                    Ok(None) => {
                        // Warning already recorded by the adapter; route stays unset
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "route request failed");
                    }
                }
            }
            GatewayRequest::Cancel => {
                let _ = self.bus.send(DashboardEvent::RouteCleared);
            }
        }
    }
}
