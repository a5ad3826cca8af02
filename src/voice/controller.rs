//! Async driver for the voice state machine
//!
//! Owns the recognizer event stream, the capture-window and cool-down
//! deadlines, and the dispatch of extracted destinations. Deadlines are
//! fire-once and live in this task; teardown drops them, so nothing can act
//! on a session after the controller stops.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::Result;
use crate::events::{DashboardEvent, EventBus};
use crate::voice::machine::VoiceMachine;
use crate::voice::transcript::{RecognizerEvent, SpeechRecognizer};

/// Capture window length in milliseconds
pub const CAPTURE_WINDOW_MS: u64 = 3000;

/// Cool-down length in milliseconds
pub const COOLDOWN_MS: u64 = 4000;

/// Delay after the wake word before the command is extracted, letting the
/// user finish speaking while interim results keep arriving
pub const CAPTURE_WINDOW: Duration = Duration::from_millis(CAPTURE_WINDOW_MS);

/// Delay before the session fully resets after the assistant answers
pub const COOLDOWN: Duration = Duration::from_millis(COOLDOWN_MS);

/// Feedback shown when the assistant recognizes no destination
const FEEDBACK_NO_DESTINATION: &str = "No destination recognized";

/// Feedback shown when the assistant call fails
const FEEDBACK_ERROR: &str = "Error processing voice command";

/// Extracts a destination from a spoken command
#[async_trait]
pub trait DestinationExtractor: Send + Sync {
    /// Extract a destination name. `Ok(None)` means the command carries no
    /// navigable destination.
    ///
    /// # Errors
    ///
    /// Returns error if the extraction backend fails
    async fn extract(&self, command: &str) -> Result<Option<String>>;
}

#[async_trait]
impl<T: DestinationExtractor + ?Sized> DestinationExtractor for std::sync::Arc<T> {
    async fn extract(&self, command: &str) -> Result<Option<String>> {
        (**self).extract(command).await
    }
}

/// Drives one recognizer, one state machine, and one extractor
pub struct VoiceController<R, E> {
    recognizer: R,
    events: mpsc::Receiver<RecognizerEvent>,
    machine: VoiceMachine,
    extractor: E,
    dispatch: mpsc::Sender<String>,
    bus: EventBus,
    capture_window: Duration,
    cooldown: Duration,
}

impl<R, E> VoiceController<R, E>
where
    R: SpeechRecognizer,
    E: DestinationExtractor,
{
    /// Create a controller with the default 3 s capture window and 4 s
    /// cool-down
    pub const fn new(
        recognizer: R,
        events: mpsc::Receiver<RecognizerEvent>,
        machine: VoiceMachine,
        extractor: E,
        dispatch: mpsc::Sender<String>,
        bus: EventBus,
    ) -> Self {
        Self {
            recognizer,
            events,
            machine,
            extractor,
            dispatch,
            bus,
            capture_window: CAPTURE_WINDOW,
            cooldown: COOLDOWN,
        }
    }

    /// Override the capture-window and cool-down durations
    #[must_use]
    pub const fn with_timings(mut self, capture_window: Duration, cooldown: Duration) -> Self {
        self.capture_window = capture_window;
        self.cooldown = cooldown;
        self
    }

    /// Run until shutdown is signalled or the recognizer channel closes.
    ///
    /// On exit the machine is reset and the recognizer explicitly stopped.
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer cannot start initially
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.recognizer.start().await?;
        tracing::info!("voice controller listening");

        let mut capture_deadline: Option<Instant> = None;
        let mut cooldown_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                maybe = self.events.recv() => match maybe {
                    Some(RecognizerEvent::Transcript(event)) => {
                        let transcript = event.concatenated();
                        if self.machine.observe_transcript(&transcript) {
                            capture_deadline = Some(Instant::now() + self.capture_window);
                            self.publish(DashboardEvent::VoiceListening);
                        }
                    }
                    Some(RecognizerEvent::Ended) => {
                        // The stream must stay alive for wake-word detection;
                        // restart failures indicate no actionable fault
                        tracing::debug!("recognition stream ended, restarting");
                        if let Err(e) = self.recognizer.start().await {
                            tracing::debug!(error = %e, "recognizer restart failed");
                        }
                    }
                    None => {
                        tracing::debug!("recognizer event channel closed");
                        break;
                    }
                },
                () = sleep_until_deadline(capture_deadline), if capture_deadline.is_some() => {
                    capture_deadline = None;
                    if let Some(command) = self.machine.end_capture_window() {
                        self.process_command(&command).await;
                        cooldown_deadline = Some(Instant::now() + self.cooldown);
                    } else {
                        // False trigger: no feedback, straight back to idle
                        self.publish(DashboardEvent::VoiceIdle);
                    }
                }
                () = sleep_until_deadline(cooldown_deadline), if cooldown_deadline.is_some() => {
                    cooldown_deadline = None;
                    self.machine.end_cooldown();
                    self.publish(DashboardEvent::VoiceIdle);
                }
            }
        }

        self.machine.reset();
        self.recognizer.stop().await;
        tracing::info!("voice controller stopped");
        Ok(())
    }

    /// Dispatch a captured command through the extractor and record feedback
    async fn process_command(&mut self, command: &str) {
        self.publish(DashboardEvent::VoiceProcessing {
            command: command.to_string(),
        });

        let feedback = match self.extractor.extract(command).await {
            Ok(Some(destination)) => {
                if self.dispatch.send(destination.clone()).await.is_err() {
                    tracing::warn!("destination dispatch channel closed");
                }
                destination
            }
            Ok(None) => FEEDBACK_NO_DESTINATION.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "destination extraction failed");
                FEEDBACK_ERROR.to_string()
            }
        };

        self.machine.finish_processing(feedback.clone());
        self.publish(DashboardEvent::VoiceFeedback { text: feedback });
    }

    /// Best-effort event publish; a bus without subscribers is fine
    fn publish(&self, event: DashboardEvent) {
        let _ = self.bus.send(event);
    }
}

/// Sleep until `deadline`, or forever when there is none.
///
/// Used with a select guard; the pending branch is never polled when the
/// deadline is unset.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
