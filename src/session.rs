//! # Session state
//!
//! The current question as an explicit state object, passed into each
//! interaction handler instead of living in ambient storage. There is one
//! question at a time: typed text overwrites it when non-empty, a successful
//! voice capture overwrites it, and a failed capture leaves it untouched.

use crate::voice::{TranscribeError, Transcriber};

/// Session-scoped state: the user's current question.
///
/// Created per session; the question is overwritten by the next interaction
/// and never deleted explicitly.
#[derive(Debug, Default, Clone)]
pub struct PromptSession {
    question: String,
}

impl PromptSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current question. Empty until something is typed or heard.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// `true` once a non-empty question is stored.
    pub fn has_question(&self) -> bool {
        !self.question.trim().is_empty()
    }

    /// Store typed text as the current question. Whitespace-only input is
    /// ignored so an empty text box never clobbers a spoken question.
    pub fn set_typed(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.question = trimmed.to_string();
        }
    }
}

/// Outcome of one microphone capture attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum VoiceIntake {
    /// The transcript, already stored as the session's question.
    Heard(String),
    /// A user-facing diagnostic; the stored question is unchanged.
    Failed(String),
}

/// Capture one utterance and store it as the current question.
///
/// On success the transcript replaces the session's question. On failure the
/// session is left unchanged and a diagnostic message is returned for the
/// interface to display — capture failures never propagate as errors.
pub fn capture_question(
    session: &mut PromptSession,
    transcriber: &mut dyn Transcriber,
) -> VoiceIntake {
    match transcriber.listen() {
        Ok(transcript) => {
            session.question = transcript.clone();
            VoiceIntake::Heard(transcript)
        }
        Err(TranscribeError::Unintelligible) => {
            VoiceIntake::Failed("Could not understand audio.".to_string())
        }
        Err(TranscribeError::ServiceUnavailable(_)) => {
            VoiceIntake::Failed("Speech recognition service unavailable.".to_string())
        }
    }
}
