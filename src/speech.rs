//! # Speech output
//!
//! Background narration of resolved answers. A [`Narrator`] owns the
//! synthesis backend, a per-utterance cancellation flag, and the current
//! worker handle — no process-wide singletons, so concurrent sessions don't
//! share state.
//!
//! Narration is fire-and-forget: [`Narrator::narrate`] spawns a blocking task
//! and returns immediately. Starting a new narration first requests
//! cancellation of any in-flight one, so a new utterance always supersedes
//! the previous. Cancellation is best-effort: once the engine has started
//! speaking, [`Narrator::stop`] asks it to halt but cannot guarantee the
//! utterance ends mid-word.

use std::error::Error;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Seam to the text-to-speech collaborator.
///
/// `speak` blocks until the utterance finishes (it runs on a blocking task);
/// `halt` requests an immediate stop of whatever is playing.
pub trait SpeechBackend: Send + Sync {
    /// Synthesize and play `text`, blocking until done or halted.
    fn speak(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Best-effort stop of the current utterance.
    fn halt(&self);
}

/// Speech backend that shells out to the platform synthesizer:
/// `say` on macOS, `espeak` elsewhere.
pub struct SystemSpeech {
    rate: u32,
    voice: Option<String>,
    // Each spawned process is tagged with an utterance id; waiters bail out
    // as soon as the slot no longer holds their own process, so a superseded
    // `speak` never polls (or reaps) a newer utterance's child.
    child: Mutex<Option<(u64, Child)>>,
    next_utterance: AtomicU64,
}

impl SystemSpeech {
    /// Create a backend with the given speaking rate (words per minute) and
    /// optional named voice.
    pub fn new(rate: u32, voice: Option<String>) -> Self {
        Self {
            rate,
            voice,
            child: Mutex::new(None),
            next_utterance: AtomicU64::new(0),
        }
    }

    fn command(&self, text: &str) -> Command {
        let rate = self.rate.to_string();
        let mut cmd = if cfg!(target_os = "macos") {
            let mut c = Command::new("say");
            c.arg("-r").arg(&rate);
            if let Some(ref voice) = self.voice {
                c.arg("-v").arg(voice);
            }
            c
        } else {
            let mut c = Command::new("espeak");
            c.arg("-s").arg(&rate);
            if let Some(ref voice) = self.voice {
                c.arg("-v").arg(voice);
            }
            c
        };
        cmd.arg(text);
        cmd
    }

    /// Poll until the process owning `id` exits, clearing the slot on exit.
    ///
    /// Returns immediately, without touching the slot, when the slot is
    /// empty (halt() reaped the process) or holds a different utterance (a
    /// newer `speak` superseded this one).
    fn wait_for(&self, id: u64) -> Result<(), Box<dyn Error + Send + Sync>> {
        loop {
            let mut guard = self.child.lock().unwrap();
            match guard.as_mut() {
                Some((owner, child)) if *owner == id => {
                    if child.try_wait()?.is_some() {
                        *guard = None;
                        return Ok(());
                    }
                }
                _ => return Ok(()),
            }
            drop(guard);
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
    }
}

impl SpeechBackend for SystemSpeech {
    fn speak(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let child = self.command(text).spawn()?;
        let id = self.next_utterance.fetch_add(1, Ordering::SeqCst);

        let displaced = self.child.lock().unwrap().replace((id, child));
        if let Some((_, mut old)) = displaced {
            let _ = old.kill();
            let _ = old.wait();
        }

        self.wait_for(id)
    }

    fn halt(&self) {
        let mut guard = self.child.lock().unwrap();
        if let Some((_, mut child)) = guard.take() {
            if let Err(e) = child.kill() {
                warn!("Failed to stop the speech process: {e}");
            }
            let _ = child.wait();
        }
    }
}

/// Narration service: one in-flight utterance, superseded (not queued) by a
/// new narration or a stop request.
pub struct Narrator {
    backend: Arc<dyn SpeechBackend>,
    cancel: Arc<AtomicBool>,
    worker: Option<tokio::task::JoinHandle<()>>,
}

impl Narrator {
    /// Create a narrator around a synthesis backend.
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self {
            backend,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Begin narrating `text` without blocking the caller.
    ///
    /// Any in-flight utterance is cancelled first, and the pending
    /// cancellation signal is cleared for the new one: the fresh utterance
    /// always starts with a clean flag.
    pub fn narrate(&mut self, text: String) {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);
        let backend = Arc::clone(&self.backend);

        debug!("Starting narration: {} chars", text.len());
        self.worker = Some(tokio::task::spawn_blocking(move || {
            if cancel.load(Ordering::SeqCst) {
                return;
            }
            if let Err(e) = backend.speak(&text) {
                warn!("Narration failed: {e}");
            }
        }));
    }

    /// Request an immediate, best-effort halt of the current utterance.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.backend.halt();
    }

    /// Wait for the current worker to finish. Useful for one-shot commands
    /// that would otherwise exit before the answer is spoken.
    pub async fn await_utterance(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}
