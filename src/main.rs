//! Main module for the Wonder Why CLI application (ww).
//!
//! This module provides the main function and auxiliary functionalities for
//! the CLI application. It handles command parsing, configuration loading,
//! and wiring of the pipeline pieces (cache, encyclopedia client, narrator,
//! transcriber) before invoking the requested command.
//!
//! # Examples
//!
//! Asking a single question:
//!
//! ```sh
//! ww ask "why is the sky blue"
//! ```
//!
//! Starting the interactive playground:
//!
//! ```sh
//! ww play
//! ```
//!
//! Initializing the application's configuration:
//!
//! ```sh
//! ww init
//! ```

use std::{error::Error, fs, sync::Arc};

use clap::Parser;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use wonder_why::cache::{EMBEDDING_DIMENSION, MiniLmEmbedder, SemanticCache};
use wonder_why::commands;
use wonder_why::config::{self, WonderWhyConfig};
use wonder_why::config_dir;
use wonder_why::encyclopedia::EncyclopediaClient;
use wonder_why::repl;
use wonder_why::resolver;
use wonder_why::speech::{Narrator, SystemSpeech};
use wonder_why::voice::{CommandTranscriber, Transcriber};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Main asynchronous function of the Wonder Why CLI application.
///
/// Loads configuration, parses command-line arguments, and executes the
/// appropriate command.
///
/// # Errors
///
/// Returns an error if there is an issue loading the configuration, parsing
/// the command-line arguments, or executing the specified command.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = commands::Cli::parse();

    if let commands::Commands::Init = cli.command {
        debug!("Initializing configuration");
        return init();
    }

    let config_path = config_dir()?.join("config.yaml");
    debug!("Loading config from: {}", config_path.display());
    let config = config::load_config(
        config_path
            .to_str()
            .ok_or("Config path is not valid UTF-8")?,
    )?;
    debug!("Config loaded: {:?}", config);

    let embedder = MiniLmEmbedder::load()?;
    let mut cache = SemanticCache::new(EMBEDDING_DIMENSION, Box::new(embedder));
    let encyclopedia = EncyclopediaClient::default();
    let mut narrator = Narrator::new(Arc::new(SystemSpeech::new(
        config.speech_rate,
        config.speech_voice.clone(),
    )));

    match cli.command {
        commands::Commands::Ask { question, quiet } => {
            if question.trim().is_empty() {
                println!("Please type or speak your question.");
                return Ok(());
            }

            let resolved =
                resolver::resolve(&config, &mut cache, &encyclopedia, question.trim()).await;
            println!("{}", resolved.text);

            if !quiet {
                narrator.narrate(resolved.text);
                narrator.await_utterance().await;
            }
        }
        commands::Commands::Play => {
            let mut transcriber = transcriber_from(&config);
            repl::playground(
                &config,
                &mut cache,
                &encyclopedia,
                &mut narrator,
                transcriber.as_mut(),
            )
            .await?;
        }
        commands::Commands::Init => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Build the microphone transcriber from configuration.
///
/// Without a configured capture command every `:mic` attempt reports the
/// recognition service as unavailable, which the session layer surfaces as a
/// diagnostic instead of an error.
fn transcriber_from(config: &WonderWhyConfig) -> Box<dyn Transcriber> {
    let command = config
        .mic_command
        .clone()
        .unwrap_or_else(|| "echo 'mic_command is not configured' >&2; exit 1".to_string());
    Box::new(CommandTranscriber::new(command))
}

/// Initializes the application's configuration.
///
/// Creates the configuration directory and writes a starter `config.yaml` in
/// YAML format.
///
/// # Errors
///
/// Returns an error if there is an issue creating the directory or file, or
/// serializing the configuration to YAML.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = config_dir()?;
    info!("Creating config directory: {}", config_dir.display());
    fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.yaml");
    info!("Creating config file: {}", config_path.display());
    let config = WonderWhyConfig::default();
    let config_yaml = serde_yaml::to_string(&config)?;
    fs::write(config_path, config_yaml)?;

    Ok(())
}
