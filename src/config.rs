//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the `WonderWhyConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a YAML file.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use wonder_why::config::{WonderWhyConfig, load_config};
//!
//! let config: WonderWhyConfig = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::{env, error::Error, fs};

use tracing::debug;

/// Environment variable that overrides the API key from the config file.
///
/// The playground talks to hosted chat endpoints, so the key is usually kept
/// out of the on-disk config and supplied via the environment instead.
pub const API_KEY_ENV_VAR: &str = "WONDER_WHY_API_KEY";

/// Represents the application's configuration.
///
/// This struct holds the parameters needed to run the playground: the chat
/// endpoint and model, and the narration/intake knobs. It can be constructed
/// by loading a YAML configuration file using the `load_config` function.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct WonderWhyConfig {
    /// The API key used to authenticate requests to the chat API.
    pub api_key: String,

    /// The base URL of the OpenAI-compatible chat API.
    pub api_base: String,

    /// The name of the model to be used for generating answers.
    pub model: String,

    /// Maximum tokens requested for a single answer.
    pub max_answer_tokens: u32,

    /// Narration speed in words per minute.
    pub speech_rate: u32,

    /// Optional named voice for the speech synthesizer.
    pub speech_voice: Option<String>,

    /// Optional shell command that captures one utterance from the microphone
    /// and prints the transcript to stdout.
    pub mic_command: Option<String>,
}

/// Loads the application's configuration from a YAML file.
///
/// This function reads the file at the given path, parses it as YAML, and
/// constructs a `WonderWhyConfig` struct from it. When the
/// [`API_KEY_ENV_VAR`] environment variable is set, its value replaces the
/// key from the file.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(WonderWhyConfig)`: The loaded configuration.
/// - `Err(Box<dyn Error>)`: An error occurred while reading the file or parsing the YAML.
///
/// # Examples
///
/// ```no_run
/// use wonder_why::config::load_config;
///
/// match load_config("/path/to/config.yaml") {
///     Ok(config) => println!("{:?}", config),
///     Err(err) => eprintln!("Error loading config: {}", err),
/// }
/// ```
pub fn load_config(file: &str) -> Result<WonderWhyConfig, Box<dyn Error>> {
    debug!("Loading config: {file}");
    let content = fs::read_to_string(file)?;
    let mut config: WonderWhyConfig = serde_yaml::from_str(&content)?;

    if let Ok(key) = env::var(API_KEY_ENV_VAR) {
        config.api_key = key;
    }

    Ok(config)
}

impl Default for WonderWhyConfig {
    fn default() -> Self {
        Self {
            api_key: "CHANGEME".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_answer_tokens: 1024,
            speech_rate: 150,
            speech_voice: None,
            mic_command: None,
        }
    }
}
