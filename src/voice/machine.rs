//! Voice command state machine
//!
//! One wake-word-to-command cycle:
//! `Idle -> Capturing -> Processing -> CoolingDown -> Idle`.
//! The machine is synchronous; its driver owns the capture-window and
//! cool-down timers and feeds their expiry back in. Timer inputs are
//! tolerant no-ops outside their phase, so a stale timer can never corrupt
//! a later cycle.

use uuid::Uuid;

use crate::voice::wake_word::WakeWordDetector;

/// Phase of the voice session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    /// Waiting for the wake word
    Idle,
    /// Wake word heard; accumulating the command until the capture window ends
    Capturing,
    /// Command dispatched to the assistant
    Processing,
    /// Terminal feedback visible until the cool-down ends
    CoolingDown,
}

/// The voice command state machine
pub struct VoiceMachine {
    detector: WakeWordDetector,
    phase: VoicePhase,
    pending_transcript: String,
    feedback: Option<String>,
    session_id: Option<Uuid>,
}

impl VoiceMachine {
    /// Create a machine in the idle phase
    #[must_use]
    pub const fn new(detector: WakeWordDetector) -> Self {
        Self {
            detector,
            phase: VoicePhase::Idle,
            pending_transcript: String::new(),
            feedback: None,
            session_id: None,
        }
    }

    /// Feed the latest full transcript concatenation.
    ///
    /// Returns `true` when a capture window should be armed: the wake word
    /// was heard while idle. While capturing, the pending transcript keeps
    /// tracking the latest concatenation; in any other phase (including a
    /// repeated wake word mid-cycle) the event is a no-op.
    pub fn observe_transcript(&mut self, transcript: &str) -> bool {
        match self.phase {
            VoicePhase::Idle if self.detector.heard_in(transcript) => {
                let session_id = Uuid::new_v4();
                self.phase = VoicePhase::Capturing;
                self.session_id = Some(session_id);
                self.pending_transcript = transcript.to_string();
                tracing::debug!(session = %session_id, "wake word heard, capturing command");
                true
            }
            VoicePhase::Capturing => {
                self.pending_transcript = transcript.to_string();
                false
            }
            VoicePhase::Idle | VoicePhase::Processing | VoicePhase::CoolingDown => false,
        }
    }

    /// The capture window elapsed.
    ///
    /// Returns the command to dispatch, moving to `Processing`. A trailing
    /// command at or under the length threshold is a false trigger: the
    /// machine silently returns to idle and `None` is returned. Not capturing
    /// is a no-op.
    pub fn end_capture_window(&mut self) -> Option<String> {
        if self.phase != VoicePhase::Capturing {
            return None;
        }

        match self.detector.trailing_command(&self.pending_transcript) {
            Some(command) => {
                tracing::info!(command = %command, "command captured");
                self.phase = VoicePhase::Processing;
                Some(command)
            }
            None => {
                tracing::debug!("false trigger, returning to idle");
                self.clear();
                None
            }
        }
    }

    /// Record the assistant outcome; feedback stays visible through cool-down.
    /// A no-op unless processing.
    pub fn finish_processing(&mut self, feedback: impl Into<String>) {
        if self.phase != VoicePhase::Processing {
            return;
        }

        self.feedback = Some(feedback.into());
        self.phase = VoicePhase::CoolingDown;
    }

    /// The cool-down elapsed: clear feedback and return to idle.
    /// A no-op unless cooling down.
    pub fn end_cooldown(&mut self) {
        if self.phase == VoicePhase::CoolingDown {
            self.clear();
        }
    }

    /// Force the machine back to idle, dropping any in-flight cycle
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> VoicePhase {
        self.phase
    }

    /// Whether a session is active (anything but idle)
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.phase != VoicePhase::Idle
    }

    /// Whether a command is with the assistant
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.phase == VoicePhase::Processing
    }

    /// Feedback text currently visible, if any
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Identifier of the active session, if any
    #[must_use]
    pub const fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    fn clear(&mut self) {
        self.phase = VoicePhase::Idle;
        self.pending_transcript.clear();
        self.feedback = None;
        self.session_id = None;
    }
}
