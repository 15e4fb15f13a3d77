//! # Voice intake
//!
//! Speech-to-text capture behind the [`Transcriber`] seam. Failures are
//! typed: unintelligible audio is distinct from an unreachable recognition
//! service, so the interface can phrase its diagnostic accordingly. Neither
//! failure ever alters the stored question (see [`crate::session`]).

use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Typed transcription failure.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The audio was captured but could not be understood.
    #[error("could not understand audio")]
    Unintelligible,

    /// The recognition service could not be reached or failed outright.
    #[error("speech recognition service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Seam to the speech-to-text collaborator.
pub trait Transcriber {
    /// Capture one utterance from the default input device and return the
    /// transcript.
    fn listen(&mut self) -> Result<String, TranscribeError>;
}

/// Transcriber that runs a user-configured shell command which captures one
/// utterance and prints the transcript to stdout.
///
/// The command is free to use whatever recognition engine the user has
/// installed (e.g. a whisper CLI piped from a recorder). Empty output maps to
/// [`TranscribeError::Unintelligible`]; a spawn failure or non-zero exit maps
/// to [`TranscribeError::ServiceUnavailable`].
pub struct CommandTranscriber {
    command: String,
}

impl CommandTranscriber {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl Transcriber for CommandTranscriber {
    fn listen(&mut self) -> Result<String, TranscribeError> {
        debug!("Capturing speech via: {}", self.command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .map_err(|e| TranscribeError::ServiceUnavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(TranscribeError::ServiceUnavailable(format!(
                "capture command exited with {}",
                output.status
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(TranscribeError::Unintelligible);
        }

        Ok(transcript)
    }
}
