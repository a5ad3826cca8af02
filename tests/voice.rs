//! Voice pipeline integration tests
//!
//! Drives the controller with scripted recognizer events and a stubbed
//! extractor. Timers run on the paused tokio clock, so the 3 s capture
//! window and 4 s cool-down elapse instantly but in order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;

use cockpit_gateway::events::{DashboardEvent, event_bus};
use cockpit_gateway::voice::{
    DestinationExtractor, RecognizerEvent, SpeechRecognizer, TranscriptEvent, TranscriptFragment,
    VoiceController, VoiceMachine, WakeWordDetector,
};
use cockpit_gateway::{Error, Result};

mod common;

/// Recognizer stub; the test injects events through the channel itself
struct ScriptedRecognizer {
    starts: Arc<AtomicU32>,
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&mut self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) {}
}

/// Fixed extraction outcome
#[derive(Clone)]
enum Outcome {
    Destination(&'static str),
    NoDestination,
    Failure,
}

struct StubExtractor {
    outcome: Outcome,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl DestinationExtractor for StubExtractor {
    async fn extract(&self, _command: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Destination(name) => Ok(Some((*name).to_string())),
            Outcome::NoDestination => Ok(None),
            Outcome::Failure => Err(Error::Assistant("model unreachable".to_string())),
        }
    }
}

struct Harness {
    recognizer_tx: mpsc::Sender<RecognizerEvent>,
    dispatch_rx: mpsc::Receiver<String>,
    events: broadcast::Receiver<DashboardEvent>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<Result<()>>,
    starts: Arc<AtomicU32>,
    extractor_calls: Arc<AtomicU32>,
}

fn spawn_controller(outcome: Outcome) -> Harness {
    let (recognizer_tx, recognizer_rx) = mpsc::channel(16);
    let (dispatch_tx, dispatch_rx) = mpsc::channel(16);
    let (bus, events) = event_bus();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let starts = Arc::new(AtomicU32::new(0));
    let extractor_calls = Arc::new(AtomicU32::new(0));

    let controller = VoiceController::new(
        ScriptedRecognizer {
            starts: Arc::clone(&starts),
        },
        recognizer_rx,
        VoiceMachine::new(WakeWordDetector::new("peugeot").unwrap()),
        StubExtractor {
            outcome,
            calls: Arc::clone(&extractor_calls),
        },
        dispatch_tx,
        bus,
    );

    let task = tokio::spawn(controller.run(shutdown_rx));

    Harness {
        recognizer_tx,
        dispatch_rx,
        events,
        shutdown,
        task,
        starts,
        extractor_calls,
    }
}

impl Harness {
    async fn transcript(&self, text: &str) {
        let event = TranscriptEvent::new(vec![TranscriptFragment::final_text(text)]);
        self.recognizer_tx
            .send(RecognizerEvent::Transcript(event))
            .await
            .unwrap();
    }

    async fn next_event(&mut self) -> DashboardEvent {
        tokio::time::timeout(Duration::from_secs(60), self.events.recv())
            .await
            .expect("no event before timeout")
            .expect("event bus closed")
    }

    async fn finish(self) {
        self.shutdown.send(true).unwrap();
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn none_reply_shows_feedback_then_resets() {
    let mut h = spawn_controller(Outcome::NoDestination);
    let started = Instant::now();

    h.transcript("peugeot take me somewhere nice").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    // Command extraction happens only after the capture window
    let event = h.next_event().await;
    match event {
        DashboardEvent::VoiceProcessing { command } => {
            assert_eq!(command, "take me somewhere nice");
        }
        other => panic!("expected processing, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_millis(3000));

    match h.next_event().await {
        DashboardEvent::VoiceFeedback { text } => assert_eq!(text, "No destination recognized"),
        other => panic!("expected feedback, got {other:?}"),
    }

    // Feedback stays visible through the cool-down, then everything clears
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceIdle));
    assert!(started.elapsed() >= Duration::from_millis(7000));

    // NONE means no search dispatch
    assert!(h.dispatch_rx.try_recv().is_err());

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn extracted_destination_is_dispatched() {
    let mut h = spawn_controller(Outcome::Destination("Torre de Belem"));

    h.transcript("peugeot navigate to belem tower").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));
    assert!(matches!(
        h.next_event().await,
        DashboardEvent::VoiceProcessing { .. }
    ));

    match h.next_event().await {
        DashboardEvent::VoiceFeedback { text } => assert_eq!(text, "Torre de Belem"),
        other => panic!("expected feedback, got {other:?}"),
    }

    assert_eq!(h.dispatch_rx.recv().await.unwrap(), "Torre de Belem");

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn extraction_failure_shows_error_feedback() {
    let mut h = spawn_controller(Outcome::Failure);

    h.transcript("peugeot navigate home").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));
    assert!(matches!(
        h.next_event().await,
        DashboardEvent::VoiceProcessing { .. }
    ));

    match h.next_event().await {
        DashboardEvent::VoiceFeedback { text } => {
            assert_eq!(text, "Error processing voice command");
        }
        other => panic!("expected feedback, got {other:?}"),
    }

    // Failure still cools down and returns to idle
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceIdle));
    assert!(h.dispatch_rx.try_recv().is_err());

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn bare_wake_word_is_discarded_silently() {
    let mut h = spawn_controller(Outcome::Destination("anywhere"));

    h.transcript("peugeot").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    // No processing, no feedback: straight back to idle after the window
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceIdle));
    assert_eq!(h.extractor_calls.load(Ordering::SeqCst), 0);
    assert!(h.dispatch_rx.try_recv().is_err());

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn no_second_cycle_until_idle() {
    let mut h = spawn_controller(Outcome::NoDestination);

    h.transcript("peugeot take the scenic route").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    // A repeated wake word while capturing must not re-arm a cycle
    h.transcript("peugeot take the scenic route peugeot the scenic route")
        .await;

    match h.next_event().await {
        DashboardEvent::VoiceProcessing { command } => assert_eq!(command, "the scenic route"),
        other => panic!("expected processing, got {other:?}"),
    }
    assert!(matches!(
        h.next_event().await,
        DashboardEvent::VoiceFeedback { .. }
    ));

    // A wake word during cool-down is ignored: the next event is the reset
    h.transcript("peugeot another command now").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceIdle));

    // Once idle, the machine accepts a new cycle
    h.transcript("peugeot one more destination").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn repeated_wake_word_resets_captured_region() {
    let mut h = spawn_controller(Outcome::NoDestination);

    h.transcript("peugeot do one thing").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    h.transcript("peugeot do one thing peugeot navigate home").await;

    match h.next_event().await {
        DashboardEvent::VoiceProcessing { command } => assert_eq!(command, "navigate home"),
        other => panic!("expected processing, got {other:?}"),
    }

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn ended_stream_is_restarted() {
    let h = spawn_controller(Outcome::NoDestination);

    // Wait for the initial start
    while h.starts.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    h.recognizer_tx.send(RecognizerEvent::Ended).await.unwrap();

    while h.starts.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.starts.load(Ordering::SeqCst), 2);

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_capture_fires_no_timers() {
    let mut h = spawn_controller(Outcome::Destination("anywhere"));

    h.transcript("peugeot navigate to the marina").await;
    assert!(matches!(h.next_event().await, DashboardEvent::VoiceListening));

    // Tear down inside the capture window; the pending timer must not act
    h.shutdown.send(true).unwrap();
    h.task.await.unwrap().unwrap();

    assert!(h.dispatch_rx.try_recv().is_err());
    assert_eq!(h.extractor_calls.load(Ordering::SeqCst), 0);
}
