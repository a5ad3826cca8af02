//! Wake-word detection over concatenated transcripts
//!
//! The detector scans the full lower-cased concatenation of the current
//! recognition session; only the latest concatenation matters. Command
//! extraction splits at the wake word's *last* occurrence, so repeated
//! utterances of the wake word within one session reset the captured region.

use crate::{Error, Result};

/// A trailing command must be longer than this many characters
pub const MIN_COMMAND_CHARS: usize = 2;

/// Detects a wake word and extracts the trailing command
#[derive(Debug, Clone)]
pub struct WakeWordDetector {
    wake_word: String,
}

impl WakeWordDetector {
    /// Create a detector for `wake_word`
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty
    pub fn new(wake_word: &str) -> Result<Self> {
        let normalized = wake_word.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::Voice("wake word must not be empty".to_string()));
        }

        tracing::debug!(wake_word = %normalized, "wake word detector initialized");
        Ok(Self {
            wake_word: normalized,
        })
    }

    /// The normalized wake word
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// Whether `transcript` contains the wake word (case-insensitive)
    #[must_use]
    pub fn heard_in(&self, transcript: &str) -> bool {
        transcript.to_lowercase().contains(&self.wake_word)
    }

    /// Extract the command trailing the wake word's last occurrence.
    ///
    /// The trailing segment is trimmed of whitespace; anything of
    /// [`MIN_COMMAND_CHARS`] characters or fewer is treated as a false
    /// trigger and yields `None`.
    #[must_use]
    pub fn trailing_command(&self, transcript: &str) -> Option<String> {
        let lower = transcript.to_lowercase();
        let split_at = lower.rfind(&self.wake_word)? + self.wake_word.len();

        let command = transcript.get(split_at..)?.trim();
        if command.chars().count() > MIN_COMMAND_CHARS {
            Some(command.to_string())
        } else {
            None
        }
    }
}
