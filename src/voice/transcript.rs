//! Transcript events and the speech-recognizer boundary

use async_trait::async_trait;

use crate::Result;

/// One recognized fragment of speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    /// Best-guess text for this fragment
    pub text: String,

    /// Whether the platform considers this fragment stable
    pub is_final: bool,
}

impl TranscriptFragment {
    /// A finalized fragment
    #[must_use]
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    /// An interim (unstable) fragment
    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// An incremental speech-to-text result: every fragment recognized so far in
/// the current continuous session, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Ordered fragments, interim or final
    pub fragments: Vec<TranscriptFragment>,
}

impl TranscriptEvent {
    /// Build an event from fragments
    #[must_use]
    pub fn new(fragments: Vec<TranscriptFragment>) -> Self {
        Self { fragments }
    }

    /// The full lower-cased concatenation used for wake-word matching.
    ///
    /// Interim and final fragments are treated alike: only the latest full
    /// concatenation matters, never a diff.
    #[must_use]
    pub fn concatenated(&self) -> String {
        let mut text = String::new();
        for fragment in &self.fragments {
            let piece = fragment.text.trim();
            if piece.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(piece);
        }

        text.to_lowercase()
    }
}

/// Event emitted by a speech recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Updated transcription results for the current session
    Transcript(TranscriptEvent),

    /// The platform ended the continuous stream (e.g. inactivity); the
    /// consumer restarts it to keep wake-word detection alive
    Ended,
}

/// Continuous, interim-enabled speech recognition
///
/// Implementations wrap the platform speech API behind a narrow interface and
/// deliver [`RecognizerEvent`]s on a channel handed out at construction. A
/// host without the capability provides no implementation; the rest of the
/// gateway runs without voice.
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Start (or restart) the continuous recognition stream.
    ///
    /// Implementations must swallow "already started" conditions; those
    /// indicate no actionable fault.
    ///
    /// # Errors
    ///
    /// Returns error if the stream genuinely cannot be started
    async fn start(&mut self) -> Result<()>;

    /// Stop the stream. Errors from an already stopped stream are swallowed.
    async fn stop(&mut self);
}
