//! Voice command subsystem
//!
//! Wake-word detection over a live transcript stream, the capture/processing
//! state machine, and the async controller driving both. Speech recognition
//! itself is an external collaborator behind [`SpeechRecognizer`].

mod console;
mod controller;
mod machine;
mod transcript;
mod wake_word;

pub use console::ConsoleRecognizer;
pub use controller::{
    CAPTURE_WINDOW, CAPTURE_WINDOW_MS, COOLDOWN, COOLDOWN_MS, DestinationExtractor,
    VoiceController,
};
pub use machine::{VoiceMachine, VoicePhase};
pub use transcript::{RecognizerEvent, SpeechRecognizer, TranscriptEvent, TranscriptFragment};
pub use wake_word::{MIN_COMMAND_CHARS, WakeWordDetector};
