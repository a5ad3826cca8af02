//! Console speech recognizer
//!
//! Development adapter used by the CLI daemon run: each stdin line is
//! delivered as one finalized transcript fragment accumulated into the
//! current recognition session, and a blank line ends the session the way
//! platform inactivity would. Lets the voice loop be driven without any
//! speech hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::{StreamExt, wrappers::LinesStream};

use crate::Result;
use crate::voice::transcript::{
    RecognizerEvent, SpeechRecognizer, TranscriptEvent, TranscriptFragment,
};

/// Speech recognizer reading transcripts from stdin
pub struct ConsoleRecognizer {
    tx: mpsc::Sender<RecognizerEvent>,
    task: Option<JoinHandle<()>>,
    exhausted: Arc<AtomicBool>,
}

impl ConsoleRecognizer {
    /// Create the recognizer and its event receiver
    #[must_use]
    pub fn with_receiver() -> (Self, mpsc::Receiver<RecognizerEvent>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                tx,
                task: None,
                exhausted: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    async fn start(&mut self) -> Result<()> {
        // Already running or stdin exhausted: nothing to do
        if self.exhausted.load(Ordering::SeqCst)
            || self.task.as_ref().is_some_and(|t| !t.is_finished())
        {
            return Ok(());
        }

        let tx = self.tx.clone();
        let exhausted = Arc::clone(&self.exhausted);

        self.task = Some(tokio::spawn(async move {
            let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
            let mut session: Vec<TranscriptFragment> = Vec::new();

            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::debug!(error = %e, "stdin read failed");
                        break;
                    }
                };

                let line = line.trim();
                if line.is_empty() {
                    session.clear();
                    if tx.send(RecognizerEvent::Ended).await.is_err() {
                        return;
                    }
                    continue;
                }

                session.push(TranscriptFragment::final_text(line));
                let event = RecognizerEvent::Transcript(TranscriptEvent::new(session.clone()));
                if tx.send(event).await.is_err() {
                    return;
                }
            }

            exhausted.store(true, Ordering::SeqCst);
            let _ = tx.send(RecognizerEvent::Ended).await;
        }));

        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
