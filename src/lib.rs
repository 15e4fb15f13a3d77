//! # Wonder Why (library root)
//!
//! Wonder Why is a small question-answering playground for kids: a question is
//! typed or spoken, answered from a semantic cache of earlier answers when a
//! close-enough match exists, otherwise by an OpenAI-compatible chat model with
//! an encyclopedia summary as the fallback, and finally read aloud.
//!
//! The crate is organized around the **answer-resolution pipeline**:
//!
//! - [`cache`] — in-memory semantic cache (HNSW index + MiniLM embeddings).
//! - [`prompt`] — rewrites raw questions into kid-friendly instructions.
//! - [`api`] — chat-completion client bindings.
//! - [`encyclopedia`] — MediaWiki summary lookups for the fallback path.
//! - [`resolver`] — orchestration: lookup → format → model → validate →
//!   fallback → cache write. Always produces an answer.
//!
//! Around the pipeline sit the interaction pieces:
//!
//! - [`session`] / [`voice`] — the current question and voice/text intake.
//! - [`speech`] — background narration with best-effort cancellation.
//! - [`repl`] — the interactive terminal playground.
//! - [`commands`] / [`config`] — CLI parsing and YAML configuration.

use directories::ProjectDirs;
use std::error::Error;

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod encyclopedia;
pub mod prompt;
pub mod repl;
pub mod resolver;
pub mod session;
pub mod speech;
pub mod voice;

/// Return the per-platform configuration directory used by Wonder Why.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "wonder-why", "ww")`, so you get the right place on each OS
/// (e.g., `~/.config/ww` on Linux via XDG).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<std::path::PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "wonder-why", "ww")
        .ok_or("Unable to determine config directory")?;

    Ok(proj_dirs.config_dir().to_path_buf())
}
